// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `OsAdapter`: spawns the daemon as a genuine child process, wires up
//! its IPC channel over a Unix domain socket, and carries out the
//! platform-specific kill strategy.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use sentinel_core::Pid;
use tokio::net::UnixListener;
use tokio::sync::mpsc;

use super::{ChildEvent, ChildHandle, OsAdapter, OsAdapterError, SpawnSpec};

#[derive(Debug, Default)]
pub struct RealOsAdapter;

impl RealOsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OsAdapter for RealOsAdapter {
    async fn spawn(&self, spec: SpawnSpec) -> Result<ChildHandle, OsAdapterError> {
        let _ = std::fs::remove_file(&spec.ipc_socket_path);
        let listener = UnixListener::bind(&spec.ipc_socket_path).map_err(OsAdapterError::SpawnFailed)?;

        let stdout = spec.log_file.try_clone().map_err(OsAdapterError::SpawnFailed)?;
        let stderr = spec.log_file;

        let mut command = tokio::process::Command::new(&spec.node_path);
        command
            .args(&spec.node_args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        let mut child = command.spawn().map_err(OsAdapterError::SpawnFailed)?;
        let pid = child
            .id()
            .map(Pid::new)
            .ok_or_else(|| OsAdapterError::SpawnFailed(std::io::Error::other("child exited before pid was observed")))?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(64);

        // Reaper: observe the child's own exit independently of the IPC
        // channel, since a crash can sever the socket before a graceful
        // goodbye frame arrives.
        let reaper_tx = event_tx.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    let code = status.code();
                    #[cfg(unix)]
                    let signal = {
                        use std::os::unix::process::ExitStatusExt;
                        status.signal()
                    };
                    #[cfg(not(unix))]
                    let signal = None;
                    let _ = reaper_tx.send(ChildEvent::Exit { code, signal }).await;
                }
                Err(e) => {
                    let _ = reaper_tx.send(ChildEvent::Error(e.to_string())).await;
                }
            }
        });

        // Accept the child's IPC connection and pump frames in both directions.
        tokio::spawn(async move {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    let _ = event_tx.send(ChildEvent::Error(format!("accept failed: {e}"))).await;
                    return;
                }
            };
            let (mut read_half, mut write_half) = stream.into_split();

            if event_tx.send(ChildEvent::Connected).await.is_err() {
                return;
            }

            let reader_tx = event_tx.clone();
            let reader = tokio::spawn(async move {
                loop {
                    match sentinel_wire::read_message(&mut read_half).await {
                        Ok(payload) => {
                            if reader_tx.send(ChildEvent::Message(payload)).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });

            let writer = tokio::spawn(async move {
                while let Some(frame) = outbound_rx.recv().await {
                    if sentinel_wire::write_message(&mut write_half, &frame).await.is_err() {
                        break;
                    }
                }
            });

            let _ = reader.await;
            writer.abort();
        });

        Ok(ChildHandle::new(pid, event_rx, outbound_tx))
    }

    async fn exec(&self, program: &str, args: &[String]) -> Result<bool, OsAdapterError> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| OsAdapterError::ExecFailed(program.to_string(), e))?;
        Ok(output.success())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, OsAdapterError> {
        tokio::fs::read(path).await.map_err(|e| OsAdapterError::ReadFailed(path.to_path_buf(), e))
    }

    async fn open_log_append(&self, path: &Path) -> Result<std::fs::File, OsAdapterError> {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OsAdapterError::LogOpenFailed(path.to_path_buf(), e))
    }

    async fn probe_alive(&self, pid: Pid, process_name: &str) -> bool {
        probe_alive_impl(pid, process_name).await
    }

    async fn kill(&self, pid: Pid) -> Result<(), OsAdapterError> {
        kill_impl(pid).await
    }
}

#[cfg(unix)]
async fn kill_impl(pid: Pid) -> Result<(), OsAdapterError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid as NixPid;

    kill(NixPid::from_raw(pid.as_u32() as i32), Signal::SIGTERM).map_err(|e| {
        OsAdapterError::KillFailed(std::io::Error::from_raw_os_error(e as i32))
    })
}

#[cfg(not(unix))]
async fn kill_impl(pid: Pid) -> Result<(), OsAdapterError> {
    let ok = RealOsAdapter::new()
        .exec("taskkill", &["/pid".to_string(), pid.to_string(), "/t".to_string(), "/f".to_string()])
        .await?;
    if ok {
        Ok(())
    } else {
        Err(OsAdapterError::KillFailed(std::io::Error::other("taskkill reported failure")))
    }
}

#[cfg(unix)]
async fn probe_alive_impl(pid: Pid, process_name: &str) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid as NixPid;

    if kill(NixPid::from_raw(pid.as_u32() as i32), None).is_err() {
        return false;
    }
    let comm_path = format!("/proc/{}/comm", pid.as_u32());
    match tokio::fs::read_to_string(&comm_path).await {
        Ok(comm) => comm.trim() == process_name,
        // No /proc (non-Linux unix): liveness alone is the best we can do.
        Err(_) => true,
    }
}

#[cfg(not(unix))]
async fn probe_alive_impl(_pid: Pid, _process_name: &str) -> bool {
    // No portable liveness probe without a crate we don't otherwise need;
    // callers on this platform rely on the child-exit event instead.
    false
}
