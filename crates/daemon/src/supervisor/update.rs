// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `expect_update`: self-update handshake.

use std::sync::Arc;

use sentinel_core::{Clock, LifecycleState};

use crate::error::UpdateError;
use crate::wait::await_condition;

use super::Supervisor;

impl<C: Clock> Supervisor<C> {
    /// Move into `UPDATING` and wait for the daemon to confirm via exit
    /// code `20` (driven by `handle_exit`'s dispatch, which lands the state
    /// on `UPDATED`), then wait for the resulting exit to actually be
    /// processed. Either wait timing out invokes `kill` and abandons the
    /// update as `UPDATE_FAILED`.
    pub async fn expect_update(self: &Arc<Self>) -> Result<(), UpdateError> {
        self.transition(LifecycleState::Updating).await;

        let update_timeout = { self.inner.lock().await.config.as_ref().map(|c| c.update_timeout()).unwrap_or_default() };

        let became_updated = {
            let sup = self.clone();
            await_condition(
                move || {
                    let sup = sup.clone();
                    async move { sup.state().await == LifecycleState::Updated }
                },
                update_timeout,
            )
            .await
        };
        if !became_updated {
            return self.fail_update().await;
        }

        let process_gone = {
            let sup = self.clone();
            await_condition(
                move || {
                    let sup = sup.clone();
                    async move { sup.inner.lock().await.child.is_none() }
                },
                update_timeout,
            )
            .await
        };
        if !process_gone {
            return self.fail_update().await;
        }

        Ok(())
    }

    async fn fail_update(self: &Arc<Self>) -> Result<(), UpdateError> {
        self.transition(LifecycleState::UpdateFailed).await;
        if let Some(pid) = self.pid().await {
            let _ = self.os.kill(pid).await;
        }
        self.reset().await;
        Err(UpdateError::UpdateTimeout)
    }
}
