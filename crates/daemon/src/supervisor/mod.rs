// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Supervisor core: owns the daemon's lifecycle end-to-end.
//!
//! Each public operation treats the Supervisor's mutable state as a
//! critical section guarded by a single `tokio::sync::Mutex`, so at most
//! one lifecycle transition is in flight at any moment. The child's IPC
//! events (`message`, `exit`, `error`) are funneled through one
//! `run_event_pump` task per spawn, which acquires the same lock before
//! mutating anything — so operation handlers and event handlers never
//! interleave on the shared state.

mod events;
mod fault;
mod restart;
mod start;
mod stop;
mod update;

use std::sync::Arc;

use sentinel_adapters::{Broadcaster, KvStore, OsAdapter};
use sentinel_core::{Clock, DaemonConfig, ListenerSet, Pid, Status, SystemClock, TlsConfig};
use tokio::sync::{oneshot, Mutex};
use tracing::warn;

use sentinel_core::LifecycleState;

use crate::fault_tracker::FaultTracker;

/// Everything the Supervisor tracks about a live child process, beyond the
/// shared `child: Option<ChildHandle>` state field.
pub(crate) struct ChildState {
    pub(crate) pid: Pid,
    /// `None` once `disconnect` has been called — sending further frames
    /// is a no-op rather than an error.
    pub(crate) outbound: Option<tokio::sync::mpsc::Sender<Vec<u8>>>,
    pub(crate) pump: tokio::task::JoinHandle<()>,
}

impl Drop for ChildState {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// The Supervisor's mutable state, owned exclusively by the Supervisor.
struct Inner {
    state: LifecycleState,
    config: Option<DaemonConfig>,
    child: Option<ChildState>,
    tls: Option<TlsConfig>,
    status: Option<Status>,
    startup_tries: u32,
    /// Fulfilled by `run_event_pump` on `ChildEvent::Connected`; consumed
    /// once by whichever `start` call is currently waiting.
    connect_waiter: Option<oneshot::Sender<()>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: LifecycleState::Stopped,
            config: None,
            child: None,
            tls: None,
            status: None,
            startup_tries: 0,
            connect_waiter: None,
        }
    }
}

/// Supervises a single node daemon process end-to-end.
///
/// `C` is the clock used for structured log timestamps; production code
/// uses the default `SystemClock`, tests inject a `FakeClock`.
pub struct Supervisor<C: Clock = SystemClock> {
    os: Arc<dyn OsAdapter>,
    kv: Arc<dyn KvStore>,
    broadcaster: Arc<dyn Broadcaster>,
    listeners: ListenerSet,
    clock: C,
    fault_tracker: Arc<FaultTracker>,
    inner: Mutex<Inner>,
}

impl<C: Clock> Supervisor<C> {
    /// Construct a new Supervisor, in the initial `STOPPED` state.
    pub fn new(
        os: Arc<dyn OsAdapter>,
        kv: Arc<dyn KvStore>,
        broadcaster: Arc<dyn Broadcaster>,
        listeners: ListenerSet,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self {
            os,
            kv,
            broadcaster,
            listeners,
            clock,
            fault_tracker: Arc::new(FaultTracker::new()),
            inner: Mutex::new(Inner::new()),
        })
    }

    // -- Public getters ---------------------------------------------------

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    pub async fn status(&self) -> Option<Status> {
        self.inner.lock().await.status.clone()
    }

    pub async fn save_status(&self, status: Status) {
        self.inner.lock().await.status = Some(status);
    }

    pub async fn pid(&self) -> Option<Pid> {
        self.inner.lock().await.child.as_ref().map(|c| c.pid)
    }

    pub async fn startup_tries(&self) -> u32 {
        self.inner.lock().await.startup_tries
    }

    pub async fn tls_config(&self) -> Option<TlsConfig> {
        self.inner.lock().await.tls.clone()
    }

    /// The set of fault identifiers the daemon has confirmed active.
    pub fn active_faults(&self) -> sentinel_core::FaultSet {
        self.fault_tracker.snapshot()
    }

    // -- Internal transition plumbing -----------------------------------

    /// Apply a table-admissible transition, firing the matching listener
    /// and broadcasting the new state. A no-op if already in
    /// `to` (keeps duplicate-frame handling idempotent); logs and ignores
    /// an illegal transition rather than panicking, since listener/event
    /// ordering races should degrade gracefully, not crash the supervisor.
    pub(crate) async fn transition(self: &Arc<Self>, to: LifecycleState) {
        let fired = {
            let mut inner = self.inner.lock().await;
            if inner.state == to {
                false
            } else if !inner.state.can_transition_to(to) {
                warn!(from = ?inner.state, to = ?to, "illegal lifecycle transition attempted; ignoring");
                false
            } else {
                inner.state = to;
                if to == LifecycleState::Running {
                    inner.startup_tries = 0;
                }
                true
            }
        };
        if fired {
            self.fire_listener(to);
            tracing::debug!(to = ?to, epoch_ms = self.clock.epoch_ms(), "lifecycle transition");
            self.broadcaster.broadcast_state_change(to).await;
        }
    }

    /// Enter `STARTING`. Bypasses the static adjacency table: `STARTING` is
    /// reachable from any state that `LifecycleState::accepts_start` allows,
    /// which the caller has already checked — the table only models the
    /// states reachable without the caller-supplied `forced` flag (see
    /// `can_transition_to`'s doc comment).
    pub(crate) async fn enter_starting(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = LifecycleState::Starting;
        }
        self.fire_listener(LifecycleState::Starting);
        self.broadcaster.broadcast_state_change(LifecycleState::Starting).await;
    }

    /// Forcefully enter `STOPPING` for an explicit `stop`/`kill` call,
    /// bypassing the adjacency table. A caller may legitimately invoke
    /// either from `STARTING` or `UPDATING` (recovering from a timed-out
    /// `start`/`expect_update`), not just from `RUNNING` — the table only
    /// models the single `(Running, Stopping)` edge reached via the
    /// ordinary lifecycle, so it would otherwise drop the transition and
    /// strand the supervisor reporting a state it can never leave.
    pub(crate) async fn enter_stopping(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = LifecycleState::Stopping;
        }
        self.fire_listener(LifecycleState::Stopping);
        self.broadcaster.broadcast_state_change(LifecycleState::Stopping).await;
    }

    /// Transition to `CRASHED`, carrying the exit payload to `on_crashed`.
    pub(crate) async fn transition_crashed(self: &Arc<Self>, exit_code: Option<i32>, signal: Option<i32>) {
        let fired = {
            let mut inner = self.inner.lock().await;
            if inner.state == LifecycleState::Crashed {
                false
            } else if !inner.state.can_transition_to(LifecycleState::Crashed) {
                warn!(from = ?inner.state, "illegal transition to CRASHED attempted; ignoring");
                false
            } else {
                inner.state = LifecycleState::Crashed;
                true
            }
        };
        if fired {
            self.listeners.fire_crashed(exit_code, signal);
            self.broadcaster.broadcast_state_change(LifecycleState::Crashed).await;
        }
    }

    /// Transition to `ERRORED`. Errors are exceptional and can interrupt any
    /// state, so this bypasses the adjacency table entirely.
    pub(crate) async fn transition_errored(self: &Arc<Self>, message: &str) {
        let fired = {
            let mut inner = self.inner.lock().await;
            if inner.state == LifecycleState::Errored {
                false
            } else {
                inner.state = LifecycleState::Errored;
                true
            }
        };
        if fired {
            self.listeners.fire_error(message);
            self.broadcaster.broadcast_state_change(LifecycleState::Errored).await;
        }
    }

    fn fire_listener(&self, state: LifecycleState) {
        use LifecycleState::*;
        match state {
            Starting => self.listeners.fire_starting(),
            Running => self.listeners.fire_running(),
            Exiting => self.listeners.fire_exiting(),
            Stopping => self.listeners.fire_stopping(),
            Updating => self.listeners.fire_updating(),
            Updated => self.listeners.fire_updated(),
            Stopped => self.listeners.fire_stopped(),
            // No dedicated hook; observers still get the broadcast.
            Crashed | Errored | Unrecoverable | UpdateFailed => {}
        }
    }

    /// Release everything tied to the current child: abort its event pump
    /// (dropping `ChildState` does this), clear the cached TLS config, and
    /// drop any outstanding connect waiter. Idempotent — a no-op once
    /// already reset.
    pub(crate) async fn reset(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        inner.child = None;
        inner.tls = None;
        inner.connect_waiter = None;
    }

    /// Persist the daemon's pid so a future supervisor instance can reap it
    /// if this one goes away uncleanly.
    pub(crate) async fn persist_pid(&self, pid: Pid) -> Result<(), sentinel_adapters::PersistenceError> {
        let key = { self.inner.lock().await.config.as_ref().map(|c| c.persistence_key.clone()) };
        if let Some(key) = key {
            self.kv.set_int(&key, pid.as_u32() as i64).await?;
        }
        Ok(())
    }
}
