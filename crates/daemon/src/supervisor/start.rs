// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `start` and orphan reaping.

use std::sync::Arc;

use sentinel_adapters::SpawnSpec;
use sentinel_core::{Clock, DaemonConfig, LifecycleState, Pid};
use sentinel_wire::ToDaemon;
use tracing::info;

use crate::error::StartError;
use crate::wait::await_condition;

use super::{ChildState, Supervisor};

impl<C: Clock> Supervisor<C> {
    /// Start the daemon per `config`.
    ///
    /// Preconditions are checked in order; any failure short-circuits with
    /// no state change beyond what's already described in each step.
    pub async fn start(self: &Arc<Self>, config: DaemonConfig, forced: bool) -> Result<(), StartError> {
        {
            let inner = self.inner.lock().await;
            if inner.child.is_some() || !inner.state.accepts_start(forced) {
                return Err(StartError::AlreadyRunning);
            }
        }

        self.reap_orphan(&config).await?;

        {
            let inner = self.inner.lock().await;
            if !forced && inner.startup_tries >= config.startup_max_retries {
                return Err(StartError::TooManyRetries(config.startup_max_retries));
            }
        }

        {
            let mut inner = self.inner.lock().await;
            inner.config = Some(config.clone());
            inner.startup_tries += 1;
        }
        self.enter_starting().await;

        let log_file = match self.os.open_log_append(&config.log_file_path).await {
            Ok(log_file) => log_file,
            Err(e) => {
                self.finish_start_failure().await;
                return Err(StartError::InternalIo(e));
            }
        };
        let ipc_socket_path = config.log_file_path.with_extension("sock");
        let spawn_spec = SpawnSpec {
            node_path: config.node_path.clone(),
            node_args: config.node_args.clone(),
            log_file,
            ipc_socket_path,
        };

        let child_handle = match self.os.spawn(spawn_spec).await {
            Ok(handle) => handle,
            Err(e) => {
                self.finish_start_failure().await;
                return Err(StartError::InternalIo(e));
            }
        };

        let (pid, events_rx, outbound_tx) = child_handle.split();
        let (connect_tx, connect_rx) = tokio::sync::oneshot::channel();
        {
            let mut inner = self.inner.lock().await;
            inner.connect_waiter = Some(connect_tx);
        }

        let pump_sup = self.clone();
        let pump = tokio::spawn(async move { pump_sup.run_event_pump(events_rx).await });
        {
            let mut inner = self.inner.lock().await;
            inner.child = Some(ChildState { pid, outbound: Some(outbound_tx), pump });
        }

        match tokio::time::timeout(config.startup_timeout(), connect_rx).await {
            Ok(Ok(())) => {
                let outbound = { self.inner.lock().await.child.as_ref().and_then(|c| c.outbound.clone()) };
                if let Some(outbound) = outbound {
                    if let Ok(frame) = sentinel_wire::encode(&ToDaemon::QueryPort) {
                        let _ = outbound.send(frame).await;
                    }
                }
                Ok(())
            }
            _ => Err(StartError::SpawnTimeout),
        }
    }

    /// Before every `start`, reap any daemon process left behind by a prior
    /// supervisor instance.
    async fn reap_orphan(self: &Arc<Self>, config: &DaemonConfig) -> Result<(), StartError> {
        let previous = self.kv.get_int(&config.persistence_key).await.map_err(StartError::Persistence)?;
        let Some(raw_pid) = previous else { return Ok(()) };
        let pid = Pid::new(raw_pid as u32);

        if !self.os.probe_alive(pid, &config.daemon_process_name).await {
            return Ok(());
        }

        info!(pid = %pid, "reaping orphaned daemon process from a prior supervisor instance");
        self.os.kill(pid).await.map_err(|_| StartError::OrphanReapFailed)?;
        let dead = await_condition(
            {
                let os = self.os.clone();
                let name = config.daemon_process_name.clone();
                move || {
                    let os = os.clone();
                    let name = name.clone();
                    async move { !os.probe_alive(pid, &name).await }
                }
            },
            config.kill_timeout(),
        )
        .await;

        if dead {
            Ok(())
        } else {
            Err(StartError::OrphanReapFailed)
        }
    }

    /// `os.spawn` itself failed — no child, so no `exit` event will ever
    /// arrive to drive the FSM forward. Apply the same crash/unrecoverable
    /// dispatch `handle_exit` would on its "otherwise" branches.
    async fn finish_start_failure(self: &Arc<Self>) {
        let (startup_tries, max_retries) = {
            let inner = self.inner.lock().await;
            (inner.startup_tries, inner.config.as_ref().map(|c| c.startup_max_retries).unwrap_or(0))
        };
        if startup_tries >= max_retries {
            self.transition(LifecycleState::Unrecoverable).await;
        } else {
            self.transition_crashed(None, None).await;
        }
        self.reset().await;
    }
}
