// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments for the `sentinel` binary.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sentinel",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Supervises a long-running node daemon"
)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "sentinel.toml")]
    pub config: PathBuf,

    /// Restart out of UNRECOVERABLE/UPDATE_FAILED on the initial start.
    #[arg(long)]
    pub forced: bool,
}
