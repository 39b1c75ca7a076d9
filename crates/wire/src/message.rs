// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured message shapes exchanged with the daemon.

use serde::{Deserialize, Serialize};

/// Messages the supervisor sends to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ToDaemon {
    /// Sent once after the IPC channel reports connected.
    QueryPort,
    /// Fault-injection toggle; the daemon confirms via `FInjects`.
    SetFInject { fault_id: String, enabled: bool },
}

/// Messages the daemon sends to the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FromDaemon {
    /// Handshake-style announcement; logged and otherwise ignored.
    #[serde(alias = "Started")]
    Started {
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },
    /// The daemon's listening port; triggers TLS assembly.
    ReplyPort { port: u16 },
    /// The currently active fault-injection set, replacing the prior one.
    FInjects { faults: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_port_round_trips_through_json() {
        let msg = ToDaemon::QueryPort;
        let json = serde_json::to_string(&msg).unwrap();
        let back: ToDaemon = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn set_finject_carries_fields() {
        let msg = ToDaemon::SetFInject { fault_id: "slow-disk".to_string(), enabled: true };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SetFInject");
        assert_eq!(json["fault_id"], "slow-disk");
        assert_eq!(json["enabled"], true);
    }

    #[test]
    fn reply_port_deserializes_from_daemon_frame() {
        let raw = r#"{"type":"ReplyPort","port":8090}"#;
        let msg: FromDaemon = serde_json::from_str(raw).unwrap();
        assert_eq!(msg, FromDaemon::ReplyPort { port: 8090 });
    }

    #[test]
    fn finjects_deserializes_fault_list() {
        let raw = r#"{"type":"FInjects","faults":["a","b"]}"#;
        let msg: FromDaemon = serde_json::from_str(raw).unwrap();
        assert_eq!(msg, FromDaemon::FInjects { faults: vec!["a".to_string(), "b".to_string()] });
    }
}
