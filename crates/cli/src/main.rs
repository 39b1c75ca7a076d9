// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sentinel`: supervises a long-running node daemon end-to-end.

mod args;
mod config;
mod exit_error;
mod listeners;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_adapters::{ChannelBroadcaster, FileKvStore, RealOsAdapter};
use sentinel_core::{LifecycleState, SystemClock};
use sentinel_daemon::Supervisor;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use args::Args;
use config::CliConfig;
use exit_error::ExitError;

const BROADCAST_CAPACITY: usize = 64;

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        let code = e.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(1);
        tracing::error!(error = %e, "sentinel exiting");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let cli_config = CliConfig::load(&args.config)
        .map_err(|e| ExitError::new(2, format!("configuration error: {e}")))?;

    let os = Arc::new(RealOsAdapter::new());
    let kv = Arc::new(FileKvStore::open(cli_config.kv_path.clone()).await.context("failed to open pid store")?);
    let broadcaster = Arc::new(ChannelBroadcaster::new(BROADCAST_CAPACITY));
    let supervisor = Supervisor::new(os, kv, broadcaster, listeners::default_listeners(), SystemClock);

    supervisor
        .start(cli_config.daemon, args.forced)
        .await
        .map_err(|e| ExitError::new(1, format!("failed to start daemon: {e}")))?;

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, stopping daemon");
            request_stop(&supervisor).await;
        }
        _ = sigint.recv() => {
            info!("received SIGINT, stopping daemon");
            request_stop(&supervisor).await;
        }
    }

    let code = exit_code_for(supervisor.state().await);
    if code != 0 {
        return Err(ExitError::new(code, "daemon did not stop cleanly").into());
    }
    Ok(())
}

async fn request_stop(supervisor: &Arc<Supervisor<SystemClock>>) {
    if let Err(e) = supervisor.stop().await {
        warn!(error = %e, "graceful stop failed");
    }
}

/// Map the supervisor's terminal state to a process exit code. `0` for a
/// clean stop, distinct non-zero codes for the outcomes an operator or
/// init system would want to distinguish.
fn exit_code_for(state: LifecycleState) -> i32 {
    match state {
        LifecycleState::Stopped => 0,
        LifecycleState::Crashed => 1,
        LifecycleState::Unrecoverable => 3,
        LifecycleState::UpdateFailed => 4,
        LifecycleState::Errored => 5,
        _ => 1,
    }
}
