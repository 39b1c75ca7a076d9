// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcaster: forwards state changes and the TLS handshake to external
//! observers, independent of the per-instance listener callbacks.

use async_trait::async_trait;
use sentinel_core::{LifecycleState, TlsConfig};
use tokio::sync::broadcast;

/// One broadcastable event. Mirrors the two callbacks named in the
/// broadcast surface: a TLS announcement once per `RUNNING` entry, and a
/// state change on every transition.
#[derive(Debug, Clone)]
pub enum BroadcastEvent {
    StateChanged(LifecycleState),
    TlsConfig(TlsConfig),
}

/// Forwards supervisor events to external observers. Distinct from
/// `ListenerSet`: listeners are per-instance callbacks invoked synchronously
/// inline with a transition; the broadcaster is a fan-out channel any
/// number of external subscribers can tap.
#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    async fn broadcast_state_change(&self, state: LifecycleState);
    async fn broadcast_tls_config(&self, tls: TlsConfig);
}

/// Real broadcaster backed by a `tokio::sync::broadcast` channel. Publishing
/// with no subscribers attached is not an error — it simply means nobody is
/// listening right now.
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn broadcast_state_change(&self, state: LifecycleState) {
        let _ = self.sender.send(BroadcastEvent::StateChanged(state));
    }

    async fn broadcast_tls_config(&self, tls: TlsConfig) {
        let _ = self.sender.send(BroadcastEvent::TlsConfig(tls));
    }
}

/// Records broadcasts in arrival order so tests can assert that broadcast
/// order matches listener order (a testable property in its own right).
#[cfg(any(test, feature = "test-support"))]
pub struct FakeBroadcaster {
    events: parking_lot::Mutex<Vec<BroadcastEvent>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeBroadcaster {
    pub fn new() -> Self {
        Self { events: parking_lot::Mutex::new(Vec::new()) }
    }

    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().clone()
    }

    pub fn state_changes(&self) -> Vec<LifecycleState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BroadcastEvent::StateChanged(s) => Some(*s),
                BroadcastEvent::TlsConfig(_) => None,
            })
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Broadcaster for FakeBroadcaster {
    async fn broadcast_state_change(&self, state: LifecycleState) {
        self.events.lock().push(BroadcastEvent::StateChanged(state));
    }

    async fn broadcast_tls_config(&self, tls: TlsConfig) {
        self.events.lock().push(BroadcastEvent::TlsConfig(tls));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_broadcaster_delivers_to_subscriber() {
        let broadcaster = ChannelBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();
        broadcaster.broadcast_state_change(LifecycleState::Running).await;
        match rx.recv().await.unwrap() {
            BroadcastEvent::StateChanged(LifecycleState::Running) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fake_broadcaster_records_order() {
        let broadcaster = FakeBroadcaster::new();
        broadcaster.broadcast_state_change(LifecycleState::Starting).await;
        broadcaster.broadcast_tls_config(TlsConfig::new(vec![1], vec![2], vec![3], 8090)).await;
        broadcaster.broadcast_state_change(LifecycleState::Running).await;

        assert_eq!(
            broadcaster.state_changes(),
            vec![LifecycleState::Starting, LifecycleState::Running]
        );
        assert_eq!(broadcaster.events().len(), 3);
    }
}
