// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS configuration assembled from the daemon's `ReplyPort` handshake.

use serde::{Deserialize, Serialize};

/// Opaque-to-the-supervisor TLS material, forwarded verbatim to observers.
///
/// The supervisor never parses `ca`/`key`/`cert`; it only reads the bytes
/// off disk and hands them to the `Broadcaster`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    pub ca: Vec<u8>,
    pub key: Vec<u8>,
    pub cert: Vec<u8>,
    pub hostname: String,
    pub port: u16,
}

impl TlsConfig {
    pub fn new(ca: Vec<u8>, key: Vec<u8>, cert: Vec<u8>, port: u16) -> Self {
        Self { ca, key, cert, hostname: "localhost".to_string(), port }
    }
}

// Manual Debug: never print certificate/key bytes.
impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_len", &self.ca.len())
            .field("key_len", &self.key.len())
            .field("cert_len", &self.cert.len())
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_hostname_to_localhost() {
        let tls = TlsConfig::new(vec![1], vec![2], vec![3], 8090);
        assert_eq!(tls.hostname, "localhost");
        assert_eq!(tls.port, 8090);
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let tls = TlsConfig::new(vec![0xde, 0xad], vec![0xbe, 0xef], vec![1], 1);
        let rendered = format!("{:?}", tls);
        assert!(!rendered.contains("222")); // 0xde = 222 decimal
    }
}
