// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentinel-daemon: the supervisor for the long-running node daemon.
//!
//! This crate owns the daemon's lifecycle end-to-end: spawning, the IPC
//! handshake, the lifecycle state machine, TLS assembly, fault-injection
//! tracking, and orphan reaping. See `sentinel_core` for the data model and
//! `sentinel_adapters` for the swappable I/O collaborators.

mod error;
mod fault_tracker;
mod supervisor;
mod wait;

pub use error::{FaultError, KillError, RestartError, StartError, StopError, UpdateError};
pub use fault_tracker::FaultTracker;
pub use supervisor::Supervisor;
pub use wait::await_condition;
