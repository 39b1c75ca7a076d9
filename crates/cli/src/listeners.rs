// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The default `ListenerSet`: logs every lifecycle transition at `info`,
//! `warn` for crashes, and `error` for supervisor errors.

use sentinel_core::ListenerSet;
use tracing::{error, info, warn};

pub fn default_listeners() -> ListenerSet {
    ListenerSet::default()
        .with_on_starting(|| info!("daemon starting"))
        .with_on_running(|| info!("daemon running"))
        .with_on_exiting(|| info!("daemon exiting"))
        .with_on_stopping(|| info!("daemon stopping"))
        .with_on_updating(|| info!("daemon updating"))
        .with_on_updated(|| info!("daemon updated"))
        .with_on_stopped(|| info!("daemon stopped"))
        .with_on_crashed(|exit_code, signal| {
            warn!(exit_code = ?exit_code, signal = ?signal, "daemon crashed")
        })
        .with_on_error(|message| error!(error = message, "supervisor error"))
}
