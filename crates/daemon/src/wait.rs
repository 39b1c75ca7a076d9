// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wait primitive: `await_condition(predicate, timeout)`.
//!
//! Built on `tokio::time::timeout` rather than `sentinel_core::Clock`
//! directly — tests drive it deterministically with `#[tokio::test(start_paused
//! = true)]` plus `tokio::time::advance`, same as the rest of this ecosystem's
//! timeout-bearing code.

use std::time::Duration;

/// How often the predicate is re-polled while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Poll `predicate` until it returns `true` or `timeout` elapses.
///
/// Returns `true` on success, `false` on timeout. Never panics and never
/// leaves a dangling task: the polling loop lives entirely inside the
/// `tokio::time::timeout` future, so a timeout simply drops it.
pub async fn await_condition<F, Fut>(mut predicate: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(timeout, async {
        loop {
            if predicate().await {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn succeeds_as_soon_as_predicate_is_true() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let ok = await_condition(
            move || {
                let calls = calls2.clone();
                async move { calls.fetch_add(1, Ordering::SeqCst) >= 2 }
            },
            Duration::from_secs(5),
        )
        .await;
        assert!(ok);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_predicate_never_succeeds() {
        let ok = await_condition(|| async { false }, Duration::from_millis(50)).await;
        assert!(!ok);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_fails_fast_if_predicate_is_already_false() {
        let ok = await_condition(|| async { false }, Duration::from_millis(0)).await;
        assert!(!ok);
    }
}
