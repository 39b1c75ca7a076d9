// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `OsAdapter` for supervisor tests: scriptable spawn outcomes,
//! a fake file table, and a controllable liveness probe.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sentinel_core::Pid;
use tokio::sync::mpsc;

use super::{ChildEvent, ChildHandle, OsAdapter, OsAdapterError, SpawnSpec};

/// Scriptable fake of the operating system, letting supervisor tests spawn
/// a "child" whose events, exit, and liveness are driven directly from the
/// test rather than a real process.
pub struct FakeOsAdapter {
    next_pid: AtomicU32,
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    alive: Mutex<HashMap<u32, String>>,
    spawned: Mutex<Vec<PathBuf>>,
    killed: Mutex<Vec<Pid>>,
    exec_calls: Mutex<Vec<(String, Vec<String>)>>,
    spawn_should_fail: Mutex<bool>,
    open_log_should_fail: Mutex<bool>,
    auto_connect: Mutex<bool>,
    event_txs: Mutex<HashMap<u32, mpsc::Sender<ChildEvent>>>,
}

impl Default for FakeOsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOsAdapter {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            files: Mutex::new(HashMap::new()),
            alive: Mutex::new(HashMap::new()),
            spawned: Mutex::new(Vec::new()),
            killed: Mutex::new(Vec::new()),
            exec_calls: Mutex::new(Vec::new()),
            spawn_should_fail: Mutex::new(false),
            open_log_should_fail: Mutex::new(false),
            auto_connect: Mutex::new(true),
            event_txs: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    pub fn set_spawn_fails(&self, fails: bool) {
        *self.spawn_should_fail.lock() = fails;
    }

    pub fn set_open_log_fails(&self, fails: bool) {
        *self.open_log_should_fail.lock() = fails;
    }

    /// Disable the default auto-`Connected` event, so a test can simulate a
    /// spawn whose IPC channel never finishes its handshake.
    pub fn set_auto_connect(&self, auto_connect: bool) {
        *self.auto_connect.lock() = auto_connect;
    }

    pub fn mark_alive(&self, pid: Pid, process_name: impl Into<String>) {
        self.alive.lock().insert(pid.as_u32(), process_name.into());
    }

    pub fn mark_dead(&self, pid: Pid) {
        self.alive.lock().remove(&pid.as_u32());
    }

    pub fn spawned_paths(&self) -> Vec<PathBuf> {
        self.spawned.lock().clone()
    }

    pub fn killed_pids(&self) -> Vec<Pid> {
        self.killed.lock().clone()
    }

    pub fn exec_calls(&self) -> Vec<(String, Vec<String>)> {
        self.exec_calls.lock().clone()
    }

    /// Push an event into the named child's event stream as if it had
    /// arrived over IPC.
    pub async fn push_event(&self, pid: Pid, event: ChildEvent) {
        let tx = self.event_txs.lock().get(&pid.as_u32()).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }
}

#[async_trait]
impl OsAdapter for FakeOsAdapter {
    async fn spawn(&self, spec: SpawnSpec) -> Result<ChildHandle, OsAdapterError> {
        if *self.spawn_should_fail.lock() {
            return Err(OsAdapterError::SpawnFailed(std::io::Error::other("fake spawn failure")));
        }
        self.spawned.lock().push(spec.node_path.clone());

        let pid = Pid::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
        self.alive.lock().insert(pid.as_u32(), "cardano-node".to_string());

        let (event_tx, event_rx) = mpsc::channel(64);
        if *self.auto_connect.lock() {
            let _ = event_tx.send(ChildEvent::Connected).await;
        }
        self.event_txs.lock().insert(pid.as_u32(), event_tx);
        let (outbound_tx, _outbound_rx) = mpsc::channel::<Vec<u8>>(64);

        Ok(ChildHandle::new(pid, event_rx, outbound_tx))
    }

    async fn exec(&self, program: &str, args: &[String]) -> Result<bool, OsAdapterError> {
        self.exec_calls.lock().push((program.to_string(), args.to_vec()));
        Ok(true)
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OsAdapterError> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| OsAdapterError::ReadFailed(path.to_path_buf(), std::io::Error::from(std::io::ErrorKind::NotFound)))
    }

    async fn open_log_append(&self, path: &Path) -> Result<std::fs::File, OsAdapterError> {
        if *self.open_log_should_fail.lock() {
            return Err(OsAdapterError::LogOpenFailed(path.to_path_buf(), std::io::Error::other("fake log open failure")));
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OsAdapterError::LogOpenFailed(path.to_path_buf(), e))
    }

    async fn probe_alive(&self, pid: Pid, process_name: &str) -> bool {
        self.alive.lock().get(&pid.as_u32()).map(|name| name == process_name).unwrap_or(false)
    }

    async fn kill(&self, pid: Pid) -> Result<(), OsAdapterError> {
        self.killed.lock().push(pid);
        self.alive.lock().remove(&pid.as_u32());
        let tx = self.event_txs.lock().get(&pid.as_u32()).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(ChildEvent::Exit { code: None, signal: Some(15) }).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_records_path_and_assigns_pid() {
        let adapter = FakeOsAdapter::new();
        let spec = SpawnSpec {
            node_path: PathBuf::from("/usr/bin/cardano-node"),
            node_args: vec!["run".to_string()],
            log_file: tempfile::tempfile().unwrap(),
            ipc_socket_path: PathBuf::from("/tmp/sentinel.sock"),
        };
        let handle = adapter.spawn(spec).await.unwrap();
        assert_eq!(adapter.spawned_paths(), vec![PathBuf::from("/usr/bin/cardano-node")]);
        assert!(adapter.probe_alive(handle.pid(), "cardano-node").await);
    }

    #[tokio::test]
    async fn spawn_failure_is_scriptable() {
        let adapter = FakeOsAdapter::new();
        adapter.set_spawn_fails(true);
        let spec = SpawnSpec {
            node_path: PathBuf::from("/usr/bin/cardano-node"),
            node_args: vec![],
            log_file: tempfile::tempfile().unwrap(),
            ipc_socket_path: PathBuf::from("/tmp/sentinel.sock"),
        };
        assert!(adapter.spawn(spec).await.is_err());
    }

    #[tokio::test]
    async fn kill_marks_dead_and_emits_exit_event() {
        let adapter = FakeOsAdapter::new();
        let spec = SpawnSpec {
            node_path: PathBuf::from("/usr/bin/cardano-node"),
            node_args: vec![],
            log_file: tempfile::tempfile().unwrap(),
            ipc_socket_path: PathBuf::from("/tmp/sentinel.sock"),
        };
        let mut handle = adapter.spawn(spec).await.unwrap();
        let pid = handle.pid();
        match handle.recv().await {
            Some(ChildEvent::Connected) => {}
            other => panic!("expected Connected event, got {other:?}"),
        }
        adapter.kill(pid).await.unwrap();
        assert_eq!(adapter.killed_pids(), vec![pid]);
        assert!(!adapter.probe_alive(pid, "cardano-node").await);
        match handle.recv().await {
            Some(ChildEvent::Exit { signal: Some(15), .. }) => {}
            other => panic!("expected SIGTERM exit event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_file_returns_seeded_contents() {
        let adapter = FakeOsAdapter::new();
        adapter.seed_file("/etc/sentinel/tls/ca.crt", b"ca bytes".to_vec());
        let bytes = adapter.read_file(Path::new("/etc/sentinel/tls/ca.crt")).await.unwrap();
        assert_eq!(bytes, b"ca bytes");
    }

    #[tokio::test]
    async fn exec_records_calls_and_succeeds() {
        let adapter = FakeOsAdapter::new();
        let ok = adapter.exec("taskkill", &["/pid".to_string(), "123".to_string()]).await.unwrap();
        assert!(ok);
        assert_eq!(adapter.exec_calls(), vec![("taskkill".to_string(), vec!["/pid".to_string(), "123".to_string()])]);
    }
}
