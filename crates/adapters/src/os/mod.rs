// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS Adapter: process spawn, command execution, file reads, append-only
//! log creation, and the `(pid, name) -> alive?` probe.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod real;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sentinel_core::Pid;
use thiserror::Error;
use tokio::sync::mpsc;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeOsAdapter;
pub use real::RealOsAdapter;

/// Everything needed to spawn the daemon: binary path, arguments, an
/// already-opened append-mode log file for stdout/stderr, and the path at
/// which the IPC channel should be established.
pub struct SpawnSpec {
    pub node_path: PathBuf,
    pub node_args: Vec<String>,
    pub log_file: std::fs::File,
    pub ipc_socket_path: PathBuf,
}

/// One event observed on the child's IPC channel: a finite stream of
/// connect/message/exit/error events.
#[derive(Debug)]
pub enum ChildEvent {
    /// The IPC channel has accepted the child's connection.
    Connected,
    Message(Vec<u8>),
    Exit { code: Option<i32>, signal: Option<i32> },
    Error(String),
}

/// A running (or exited) child process plus its IPC channel.
pub struct ChildHandle {
    pid: Pid,
    events: mpsc::Receiver<ChildEvent>,
    outbound: mpsc::Sender<Vec<u8>>,
}

impl ChildHandle {
    pub fn new(pid: Pid, events: mpsc::Receiver<ChildEvent>, outbound: mpsc::Sender<Vec<u8>>) -> Self {
        Self { pid, events, outbound }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Consume the handle, splitting it into its pid, event receiver, and
    /// outbound sender so a long-lived owner can store each separately.
    pub fn split(self) -> (Pid, mpsc::Receiver<ChildEvent>, mpsc::Sender<Vec<u8>>) {
        (self.pid, self.events, self.outbound)
    }

    /// Receive the next IPC event, or `None` once the event source is
    /// exhausted (the child's event-forwarding task has ended).
    pub async fn recv(&mut self) -> Option<ChildEvent> {
        self.events.recv().await
    }

    /// Send a framed outbound message to the daemon.
    pub async fn send(&self, frame: Vec<u8>) -> Result<(), OsAdapterError> {
        self.outbound.send(frame).await.map_err(|_| OsAdapterError::ChannelClosed)
    }
}

impl fmt::Debug for ChildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildHandle").field("pid", &self.pid).finish()
    }
}

/// Errors from OS Adapter operations.
#[derive(Debug, Error)]
pub enum OsAdapterError {
    #[error("failed to spawn process: {0}")]
    SpawnFailed(#[source] std::io::Error),
    #[error("failed to execute command {0}: {1}")]
    ExecFailed(String, #[source] std::io::Error),
    #[error("failed to read file {0}: {1}")]
    ReadFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to open log file {0}: {1}")]
    LogOpenFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to signal process: {0}")]
    KillFailed(#[source] std::io::Error),
    #[error("IPC channel closed")]
    ChannelClosed,
}

/// Abstraction over everything the supervisor needs from the operating
/// system, so tests can substitute `FakeOsAdapter` instead of touching real
/// processes and files.
#[async_trait]
pub trait OsAdapter: Send + Sync + 'static {
    /// Spawn the daemon with stdio redirected to `spec.log_file` and an IPC
    /// channel established over `spec.ipc_socket_path`.
    async fn spawn(&self, spec: SpawnSpec) -> Result<ChildHandle, OsAdapterError>;

    /// Run a one-shot command to completion (used for `taskkill` on
    /// Windows).
    async fn exec(&self, program: &str, args: &[String]) -> Result<bool, OsAdapterError>;

    /// Read an entire file's contents.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OsAdapterError>;

    /// Open a file in append mode for daemon stdout/stderr.
    async fn open_log_append(&self, path: &Path) -> Result<std::fs::File, OsAdapterError>;

    /// `true` iff a process with `pid` is alive and its executable/command
    /// name matches `process_name`.
    async fn probe_alive(&self, pid: Pid, process_name: &str) -> bool;

    /// Issue the platform termination strategy against `pid`: a signal on
    /// Unix, `taskkill /pid <pid> /t /f` via `exec` on Windows.
    async fn kill(&self, pid: Pid) -> Result<(), OsAdapterError>;
}
