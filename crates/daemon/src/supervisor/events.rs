// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound IPC handling and exit/error handling.
//!
//! `run_event_pump` is the single task that drains a child's event stream.
//! `Exit` and `Error` are terminal for a given child, so their handlers run
//! in a freshly spawned task rather than inline: the inline handler would
//! otherwise call `reset`, which aborts this very pump task, racing its own
//! cancellation against the rest of the handler's `.await` points.

use std::sync::Arc;

use sentinel_adapters::ChildEvent;
use sentinel_core::{Clock, LifecycleState, TlsConfig};
use sentinel_wire::FromDaemon;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::Supervisor;

impl<C: Clock> Supervisor<C> {
    pub(crate) async fn run_event_pump(self: Arc<Self>, mut events: mpsc::Receiver<ChildEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ChildEvent::Connected => {
                    let waiter = self.inner.lock().await.connect_waiter.take();
                    if let Some(tx) = waiter {
                        let _ = tx.send(());
                    }
                }
                ChildEvent::Message(bytes) => {
                    self.handle_message(bytes).await;
                }
                ChildEvent::Exit { code, signal } => {
                    let sup = self.clone();
                    tokio::spawn(async move { sup.handle_exit(code, signal).await });
                    break;
                }
                ChildEvent::Error(message) => {
                    let sup = self.clone();
                    tokio::spawn(async move { sup.handle_channel_error(message).await });
                    break;
                }
            }
        }
    }

    async fn handle_message(self: &Arc<Self>, bytes: Vec<u8>) {
        let message: FromDaemon = match sentinel_wire::decode(&bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "failed to decode inbound daemon frame; ignoring");
                return;
            }
        };
        match message {
            FromDaemon::Started { .. } => {
                info!("daemon sent handshake announcement");
            }
            FromDaemon::ReplyPort { port } => self.handle_reply_port(port).await,
            FromDaemon::FInjects { faults } => {
                info!(count = faults.len(), "daemon confirmed fault injection set");
                self.fault_tracker.replace_from(faults);
            }
        }
    }

    async fn handle_reply_port(self: &Arc<Self>, port: u16) {
        let tls_path = { self.inner.lock().await.config.as_ref().map(|c| c.tls_path.clone()) };
        let Some(tls_path) = tls_path else {
            warn!("ReplyPort received with no active configuration; ignoring");
            return;
        };
        let client_dir = tls_path.join("client");

        let ca = self.os.read_file(&client_dir.join("ca.crt")).await;
        let key = self.os.read_file(&client_dir.join("client.key")).await;
        let cert = self.os.read_file(&client_dir.join("client.pem")).await;
        let (ca, key, cert) = match (ca, key, cert) {
            (Ok(ca), Ok(key), Ok(cert)) => (ca, key, cert),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                let sup = self.clone();
                let message = e.to_string();
                tokio::spawn(async move { sup.handle_channel_error(message).await });
                return;
            }
        };

        let tls = TlsConfig::new(ca, key, cert, port);
        let was_starting = { self.inner.lock().await.state == LifecycleState::Starting };
        {
            self.inner.lock().await.tls = Some(tls.clone());
        }
        if was_starting {
            self.transition(LifecycleState::Running).await;
            self.broadcaster.broadcast_tls_config(tls).await;
        }
    }

    async fn handle_exit(self: Arc<Self>, code: Option<i32>, signal: Option<i32>) {
        // Stale event: an explicit `stop`/`kill` call already tore this
        // child down and reset the state.
        if self.inner.lock().await.child.is_none() {
            return;
        }

        let original_state = self.inner.lock().await.state;
        if original_state == LifecycleState::Running {
            self.transition(LifecycleState::Exiting).await;
        }

        // Give the process a chance to actually disappear from the process
        // table before giving up on a clean confirmation.
        let (pid, name, shutdown_timeout) = {
            let inner = self.inner.lock().await;
            (
                inner.child.as_ref().map(|c| c.pid),
                inner.config.as_ref().map(|c| c.daemon_process_name.clone()),
                inner.config.as_ref().map(|c| c.shutdown_timeout()).unwrap_or_default(),
            )
        };
        if let (Some(pid), Some(name)) = (pid, name) {
            let os = self.os.clone();
            let dead = crate::wait::await_condition(
                {
                    let os = os.clone();
                    let name = name.clone();
                    move || {
                        let os = os.clone();
                        let name = name.clone();
                        async move { !os.probe_alive(pid, &name).await }
                    }
                },
                shutdown_timeout,
            )
            .await;
            if !dead {
                let _ = os.kill(pid).await;
            }
        }

        if let Some(pid) = pid {
            if let Err(e) = self.persist_pid(pid).await {
                error!(error = %e, "failed to persist daemon pid after exit");
            }
        }

        let (startup_tries, max_retries) = {
            let inner = self.inner.lock().await;
            (inner.startup_tries, inner.config.as_ref().map(|c| c.startup_max_retries).unwrap_or(0))
        };

        match original_state {
            LifecycleState::Stopping => self.transition(LifecycleState::Stopped).await,
            LifecycleState::Updating if code == Some(20) => self.transition(LifecycleState::Updated).await,
            _ if startup_tries >= max_retries => self.transition(LifecycleState::Unrecoverable).await,
            _ => self.transition_crashed(code, signal).await,
        }

        self.reset().await;
    }

    pub(crate) async fn handle_channel_error(self: Arc<Self>, message: String) {
        error!(error = %message, "daemon IPC channel error");
        self.transition_errored(&message).await;
        if let Err(e) = self.restart(false).await {
            error!(error = %e, "restart after channel error failed");
        }
    }
}
