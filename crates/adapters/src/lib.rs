// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: process spawning/killing, persistence, and
//! broadcast notification. Each adapter is a trait with one real
//! implementation and one in-memory fake, following this ecosystem's
//! convention of keeping every external collaborator swappable for tests.

pub mod broadcast;
pub mod kv;
pub mod os;

pub use broadcast::{Broadcaster, ChannelBroadcaster};
pub use kv::{FileKvStore, KvStore, PersistenceError};
pub use os::{ChildEvent, ChildHandle, OsAdapter, OsAdapterError, RealOsAdapter, SpawnSpec};

#[cfg(any(test, feature = "test-support"))]
pub use broadcast::FakeBroadcaster;
#[cfg(any(test, feature = "test-support"))]
pub use kv::FakeKvStore;
#[cfg(any(test, feature = "test-support"))]
pub use os::FakeOsAdapter;
