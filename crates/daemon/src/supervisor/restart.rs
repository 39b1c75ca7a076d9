// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `restart`: stop the current child, then start again from the last-known
//! configuration.

use std::sync::Arc;

use sentinel_core::Clock;

use crate::error::RestartError;

use super::Supervisor;

impl<C: Clock> Supervisor<C> {
    /// Stop the daemon (if connected) and start it again with the same
    /// configuration. `forced` is forwarded to `start`, allowing a restart
    /// out of `UNRECOVERABLE`/`UPDATE_FAILED`. Any failure along the way
    /// lands the supervisor in `ERRORED`, surfacing the triggering error.
    pub async fn restart(self: &Arc<Self>, forced: bool) -> Result<(), RestartError> {
        let config = { self.inner.lock().await.config.clone() };
        let config = match config {
            Some(config) => config,
            None => {
                self.transition_errored("restart called with no prior configuration").await;
                return Err(RestartError::NoConfig);
            }
        };

        if self.pid().await.is_some() {
            if let Err(e) = self.stop().await {
                self.transition_errored(&e.to_string()).await;
                return Err(e.into());
            }
        }

        if let Err(e) = self.start(config, forced).await {
            self.transition_errored(&e.to_string()).await;
            return Err(e.into());
        }

        Ok(())
    }
}
