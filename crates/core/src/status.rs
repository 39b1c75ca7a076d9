// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque status cache the supervisor holds on behalf of callers.

use serde::{Deserialize, Serialize};

/// An opaque value the supervisor caches via `save_status`; the core never
/// inspects or interprets its contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status(serde_json::Value);

impl Status {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Status {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
