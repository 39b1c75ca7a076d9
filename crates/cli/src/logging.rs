// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup for the `sentinel` binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stdout-writing subscriber honoring `RUST_LOG`, defaulting to
/// `info` when unset or invalid.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
