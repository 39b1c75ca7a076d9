// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stop` and `kill`.

use std::sync::Arc;

use sentinel_core::{Clock, LifecycleState};

use crate::error::{KillError, StopError};
use crate::wait::await_condition;

use super::Supervisor;

impl<C: Clock> Supervisor<C> {
    /// Ask the daemon to exit cooperatively, escalating to `kill` if it
    /// hasn't within `shutdown_timeout`.
    pub async fn stop(self: &Arc<Self>) -> Result<(), StopError> {
        let pid = { self.inner.lock().await.child.as_ref().map(|c| c.pid) };
        let Some(pid) = pid else {
            // Nothing to stop; already at rest.
            return Ok(());
        };

        self.enter_stopping().await;

        // Disconnect: drop the outbound sender so the IPC writer task ends,
        // a cooperative shutdown signal distinct from the OS-level kill.
        {
            if let Some(child) = self.inner.lock().await.child.as_mut() {
                child.outbound = None;
            }
        }

        let (name, shutdown_timeout) = {
            let inner = self.inner.lock().await;
            (
                inner.config.as_ref().map(|c| c.daemon_process_name.clone()).unwrap_or_default(),
                inner.config.as_ref().map(|c| c.shutdown_timeout()).unwrap_or_default(),
            )
        };

        let os = self.os.clone();
        let exited = await_condition(
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

        if exited {
            self.persist_pid(pid).await.map_err(KillError::Persistence)?;
            self.transition(LifecycleState::Stopped).await;
            self.reset().await;
            Ok(())
        } else {
            self.kill().await.map_err(StopError::Kill)
        }
    }

    /// Forcefully terminate the daemon: signal it, wait for confirmation up
    /// to `kill_timeout`, and land in a terminal state either way.
    pub async fn kill(self: &Arc<Self>) -> Result<(), KillError> {
        let pid = { self.inner.lock().await.child.as_ref().map(|c| c.pid) };
        let Some(pid) = pid else { return Ok(()) };

        self.enter_stopping().await;

        self.os.kill(pid).await.map_err(KillError::InternalIo)?;

        let (name, kill_timeout) = {
            let inner = self.inner.lock().await;
            (
                inner.config.as_ref().map(|c| c.daemon_process_name.clone()).unwrap_or_default(),
                inner.config.as_ref().map(|c| c.kill_timeout()).unwrap_or_default(),
            )
        };
        let os = self.os.clone();
        let dead = await_condition(
            {
                let os = os.clone();
                let name = name.clone();
                move || {
                    let os = os.clone();
                    let name = name.clone();
                    async move { !os.probe_alive(pid, &name).await }
                }
            },
            kill_timeout,
        )
        .await;

        self.persist_pid(pid).await.map_err(KillError::Persistence)?;

        if dead {
            self.transition(LifecycleState::Stopped).await;
            self.reset().await;
            Ok(())
        } else {
            // CRASHED best matches "the process didn't do what we told
            // it to" without implying it can still be waited on like
            // UNRECOVERABLE's exhausted-retries meaning.
            self.transition_crashed(None, None).await;
            self.reset().await;
            Err(KillError::KillFailed)
        }
    }
}
