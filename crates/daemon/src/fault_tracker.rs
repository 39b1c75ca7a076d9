// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault-injection tracker: records faults confirmed by the daemon and
//! supports acknowledgement waits.
//!
//! Kept outside the Supervisor's main state mutex so `inject_fault` can wait
//! on a confirmation without holding the lock other lifecycle operations
//! need.

use std::time::Duration;

use parking_lot::Mutex;
use sentinel_core::FaultSet;

use crate::wait::await_condition;

/// Confirmed fault-injection identifiers, updated only from the daemon's
/// `FInjects` replies; never mutated optimistically.
#[derive(Default)]
pub struct FaultTracker {
    faults: Mutex<FaultSet>,
}

impl FaultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the confirmed set wholesale, as the daemon's `FInjects`
    /// frame always carries the complete current set.
    pub fn replace_from(&self, faults: impl IntoIterator<Item = String>) {
        self.faults.lock().replace_from(faults);
    }

    /// A point-in-time clone of the confirmed set.
    pub fn snapshot(&self) -> FaultSet {
        self.faults.lock().clone()
    }

    /// Wait until `fault_id`'s confirmed membership matches `want_present`,
    /// or `timeout` elapses.
    pub async fn await_state(&self, fault_id: &str, want_present: bool, timeout: Duration) -> bool {
        await_condition(
            || async { self.faults.lock().contains(fault_id) == want_present },
            timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn await_state_succeeds_once_replaced() {
        let tracker = FaultTracker::new();
        tracker.replace_from(["slow-disk".to_string()]);
        assert!(tracker.await_state("slow-disk", true, Duration::from_millis(100)).await);
        assert!(tracker.await_state("other", false, Duration::from_millis(100)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn await_state_times_out_when_never_confirmed() {
        let tracker = FaultTracker::new();
        assert!(!tracker.await_state("slow-disk", true, Duration::from_millis(50)).await);
    }
}
