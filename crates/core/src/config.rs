// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable-after-start daemon configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for spawning and supervising the daemon.
///
/// Set on the first `start` call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Executable path of the daemon binary.
    pub node_path: PathBuf,
    /// Append-only log sink for daemon stdout/stderr.
    pub log_file_path: PathBuf,
    /// Directory containing `client/ca.crt`, `client/client.key`, `client/client.pem`.
    pub tls_path: PathBuf,
    /// Ordered argument vector passed to the daemon.
    pub node_args: Vec<String>,
    /// Milliseconds to wait for the IPC channel to report connected.
    pub startup_timeout_ms: u64,
    /// Milliseconds to wait for cooperative shutdown before escalating to kill.
    pub shutdown_timeout_ms: u64,
    /// Milliseconds to wait for a forceful kill to take effect.
    pub kill_timeout_ms: u64,
    /// Milliseconds to wait for a self-update to complete.
    pub update_timeout_ms: u64,
    /// Non-negative maximum number of unforced startup retries.
    pub startup_max_retries: u32,
    /// Executable name used to recognize an orphaned daemon process
    /// (matched against the process table during orphan reaping).
    pub daemon_process_name: String,
    /// Deployment-dependent persistence key for the last-known daemon pid,
    /// derived from the target network name, e.g.
    /// `"mainnet/previous_cardano_pid"`.
    pub persistence_key: String,
}

impl DaemonConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }

    crate::setters! {
        into {
            daemon_process_name: String,
            persistence_key: String,
        }
        set {
            node_args: Vec<String>,
            startup_max_retries: u32,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl DaemonConfig {
    /// Construct a config with sensible test defaults rooted at `dir`.
    pub fn for_testing(dir: &std::path::Path) -> Self {
        Self {
            node_path: dir.join("node-bin"),
            log_file_path: dir.join("node.log"),
            tls_path: dir.join("tls"),
            node_args: Vec::new(),
            startup_timeout_ms: 5_000,
            shutdown_timeout_ms: 5_000,
            kill_timeout_ms: 5_000,
            update_timeout_ms: 5_000,
            startup_max_retries: 3,
            daemon_process_name: "cardano-node".to_string(),
            persistence_key: "mainnet/previous_cardano_pid".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_convert_from_millis() {
        let cfg = DaemonConfig::for_testing(std::path::Path::new("/tmp/x"));
        assert_eq!(cfg.startup_timeout(), Duration::from_millis(5_000));
    }
}
