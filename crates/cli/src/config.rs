// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration file for the `sentinel` binary.

use std::path::{Path, PathBuf};

use sentinel_core::DaemonConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    ParseFailed(PathBuf, #[source] toml::de::Error),
}

/// The on-disk shape of `sentinel.toml`: the daemon's own configuration plus
/// where the supervisor keeps its persisted pid.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub daemon: DaemonConfig,
    /// Path to the JSON-file-backed pid store.
    pub kv_path: PathBuf,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }
}
