// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for downstream crates.

use std::path::Path;

/// Write the three TLS files the supervisor reads after `ReplyPort`, under
/// `{tls_path}/client/...`.
pub fn write_tls_fixture(tls_path: &Path, ca: &[u8], key: &[u8], cert: &[u8]) -> std::io::Result<()> {
    let client_dir = tls_path.join("client");
    std::fs::create_dir_all(&client_dir)?;
    std::fs::write(client_dir.join("ca.crt"), ca)?;
    std::fs::write(client_dir.join("client.key"), key)?;
    std::fs::write(client_dir.join("client.pem"), cert)?;
    Ok(())
}
