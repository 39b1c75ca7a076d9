// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The listener bundle dispatched on every lifecycle transition.
//!
//! Nine callbacks, one per named transition target plus the two
//! data-carrying terminal events (`on_crashed`, `on_error`). `Unrecoverable`
//! and `UpdateFailed` have no dedicated callback — they still reach
//! observers through `broadcast_state_change`, just without a named hook,
//! since neither carries a listener-specific payload.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

type Callback = Arc<dyn Fn() + Send + Sync>;
type CrashedCallback = Arc<dyn Fn(Option<i32>, Option<i32>) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Bundle of lifecycle listener callbacks.
///
/// Any field left unset via the builder is a no-op. Panics inside a
/// callback are caught and logged, never propagated into the supervisor
/// Listener callbacks never raise into the supervisor.
#[derive(Clone, Default)]
pub struct ListenerSet {
    on_starting: Option<Callback>,
    on_running: Option<Callback>,
    on_exiting: Option<Callback>,
    on_stopping: Option<Callback>,
    on_updating: Option<Callback>,
    on_updated: Option<Callback>,
    on_stopped: Option<Callback>,
    on_crashed: Option<CrashedCallback>,
    on_error: Option<ErrorCallback>,
}

macro_rules! simple_setter {
    ($field:ident, $setter:ident) => {
        pub fn $setter(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
            self.$field = Some(Arc::new(f));
            self
        }
    };
}

impl ListenerSet {
    simple_setter!(on_starting, with_on_starting);
    simple_setter!(on_running, with_on_running);
    simple_setter!(on_exiting, with_on_exiting);
    simple_setter!(on_stopping, with_on_stopping);
    simple_setter!(on_updating, with_on_updating);
    simple_setter!(on_updated, with_on_updated);
    simple_setter!(on_stopped, with_on_stopped);

    pub fn with_on_crashed(mut self, f: impl Fn(Option<i32>, Option<i32>) + Send + Sync + 'static) -> Self {
        self.on_crashed = Some(Arc::new(f));
        self
    }

    pub fn with_on_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    fn dispatch(label: &str, f: &Callback) {
        if catch_unwind(AssertUnwindSafe(|| f())).is_err() {
            error!(listener = label, "lifecycle listener panicked");
        }
    }

    pub fn fire_starting(&self) {
        if let Some(f) = &self.on_starting {
            Self::dispatch("on_starting", f);
        }
    }

    pub fn fire_running(&self) {
        if let Some(f) = &self.on_running {
            Self::dispatch("on_running", f);
        }
    }

    pub fn fire_exiting(&self) {
        if let Some(f) = &self.on_exiting {
            Self::dispatch("on_exiting", f);
        }
    }

    pub fn fire_stopping(&self) {
        if let Some(f) = &self.on_stopping {
            Self::dispatch("on_stopping", f);
        }
    }

    pub fn fire_updating(&self) {
        if let Some(f) = &self.on_updating {
            Self::dispatch("on_updating", f);
        }
    }

    pub fn fire_updated(&self) {
        if let Some(f) = &self.on_updated {
            Self::dispatch("on_updated", f);
        }
    }

    pub fn fire_stopped(&self) {
        if let Some(f) = &self.on_stopped {
            Self::dispatch("on_stopped", f);
        }
    }

    pub fn fire_crashed(&self, exit_code: Option<i32>, signal: Option<i32>) {
        if let Some(f) = &self.on_crashed {
            if catch_unwind(AssertUnwindSafe(|| f(exit_code, signal))).is_err() {
                error!(listener = "on_crashed", "lifecycle listener panicked");
            }
        }
    }

    pub fn fire_error(&self, message: &str) {
        if let Some(f) = &self.on_error {
            if catch_unwind(AssertUnwindSafe(|| f(message))).is_err() {
                error!(listener = "on_error", "lifecycle listener panicked");
            }
        }
    }
}
