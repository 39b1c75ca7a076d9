// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds for every public Supervisor operation.

use sentinel_adapters::{OsAdapterError, PersistenceError};
use thiserror::Error;

/// Errors from `Supervisor::start`.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("daemon is already running or starting")]
    AlreadyRunning,
    #[error("failed to reap an orphaned daemon process")]
    OrphanReapFailed,
    #[error("exceeded startup_max_retries ({0})")]
    TooManyRetries(u32),
    #[error("timed out waiting for the daemon to connect")]
    SpawnTimeout,
    #[error("internal io error: {0}")]
    InternalIo(#[from] OsAdapterError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors from `Supervisor::stop`.
#[derive(Debug, Error)]
pub enum StopError {
    #[error(transparent)]
    Kill(#[from] KillError),
}

/// Errors from `Supervisor::kill`.
#[derive(Debug, Error)]
pub enum KillError {
    #[error("daemon did not exit within kill_timeout")]
    KillFailed,
    #[error("internal io error: {0}")]
    InternalIo(#[from] OsAdapterError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors from `Supervisor::restart`.
#[derive(Debug, Error)]
pub enum RestartError {
    #[error(transparent)]
    Stop(#[from] StopError),
    #[error(transparent)]
    Start(#[from] StartError),
    #[error("no prior configuration to restart from")]
    NoConfig,
}

/// Errors from `Supervisor::expect_update`.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("timed out waiting for the self-update to complete")]
    UpdateTimeout,
}

/// Errors from `Supervisor::inject_fault`.
#[derive(Debug, Error)]
pub enum FaultError {
    #[error("timed out waiting for fault injection confirmation")]
    FaultTimeout,
    #[error("internal io error: {0}")]
    InternalIo(#[from] OsAdapterError),
}
