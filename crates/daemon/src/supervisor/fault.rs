// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `inject_fault`: toggle a fault-injection identifier and wait for the
//! daemon's confirmation.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::Clock;
use sentinel_wire::ToDaemon;

use crate::error::FaultError;

use super::Supervisor;

impl<C: Clock> Supervisor<C> {
    /// Send `SetFInject` and wait for the daemon to confirm the requested
    /// membership via `FInjects`. Defaults the wait to `startup_timeout`
    /// when no explicit `timeout` is given.
    pub async fn inject_fault(
        self: &Arc<Self>,
        fault_id: &str,
        enabled: bool,
        timeout: Option<Duration>,
    ) -> Result<(), FaultError> {
        let (outbound, default_timeout) = {
            let inner = self.inner.lock().await;
            (
                inner.child.as_ref().and_then(|c| c.outbound.clone()),
                inner.config.as_ref().map(|c| c.startup_timeout()).unwrap_or_default(),
            )
        };
        let Some(outbound) = outbound else {
            // No child connected: a no-op success.
            return Ok(());
        };

        let frame = sentinel_wire::encode(&ToDaemon::SetFInject { fault_id: fault_id.to_string(), enabled })
            .map_err(|_| FaultError::FaultTimeout)?;
        outbound.send(frame).await.map_err(|_| FaultError::FaultTimeout)?;

        let confirmed = self
            .fault_tracker
            .await_state(fault_id, enabled, timeout.unwrap_or(default_timeout))
            .await;

        if confirmed {
            Ok(())
        } else {
            Err(FaultError::FaultTimeout)
        }
    }
}
