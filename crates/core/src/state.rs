// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The eleven-state daemon lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of the supervised daemon.
///
/// `Unrecoverable` and `UpdateFailed` are terminal until an explicit forced
/// restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Exiting,
    Stopping,
    Updating,
    Updated,
    Crashed,
    Errored,
    Unrecoverable,
    UpdateFailed,
}

impl LifecycleState {
    /// `child` is expected to be present while in one of these states.
    pub fn expects_child(self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Running | Self::Exiting | Self::Stopping | Self::Updating | Self::Updated
        )
    }

    /// `tls` is expected to be present while in one of these states.
    pub fn expects_tls(self) -> bool {
        matches!(
            self,
            Self::Running | Self::Exiting | Self::Stopping | Self::Updating | Self::Updated
        )
    }

    /// States from which an unforced `start` is permitted. `start` while
    /// `STARTING`, `RUNNING`, etc. must fail `AlreadyRunning` instead.
    pub fn accepts_start(self, forced: bool) -> bool {
        match self {
            Self::Stopped | Self::Crashed | Self::Updated | Self::Errored => true,
            Self::Unrecoverable | Self::UpdateFailed => forced,
            _ => false,
        }
    }

    /// Whether `to` is a statically admissible direct successor of `self`.
    /// `Starting` is reachable from any of `accepts_start`'s states via
    /// `restart`/`start`, handled by the caller rather than this table (it
    /// depends on the `forced` flag).
    pub fn can_transition_to(self, to: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, to),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Errored)
                | (Starting, Crashed)
                | (Starting, Unrecoverable)
                | (Running, Exiting)
                | (Running, Stopping)
                | (Running, Updating)
                | (Exiting, Stopped)
                | (Exiting, Crashed)
                | (Exiting, Updated)
                | (Exiting, Unrecoverable)
                | (Stopping, Stopped)
                | (Stopping, Crashed)
                | (Updating, Updated)
                | (Updating, UpdateFailed)
                | (Updating, Crashed)
                | (Updating, Unrecoverable)
        )
    }
}

/// Raised when code attempts a transition the state machine does not permit.
#[derive(Debug, Error)]
#[error("illegal lifecycle transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;
    use super::*;

    #[test]
    fn starting_only_reachable_from_restartable_states() {
        assert!(Stopped.accepts_start(false));
        assert!(Crashed.accepts_start(false));
        assert!(Updated.accepts_start(false));
        assert!(Errored.accepts_start(false));
        assert!(!Running.accepts_start(false));
        assert!(!Starting.accepts_start(false));
    }

    #[test]
    fn unrecoverable_requires_forced_restart() {
        assert!(!Unrecoverable.accepts_start(false));
        assert!(Unrecoverable.accepts_start(true));
    }

    #[test]
    fn update_failed_requires_forced_restart() {
        assert!(!UpdateFailed.accepts_start(false));
        assert!(UpdateFailed.accepts_start(true));
    }

    #[test]
    fn table_matches_the_adjacency_diagram() {
        assert!(Stopped.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Running));
        assert!(Running.can_transition_to(Exiting));
        assert!(Running.can_transition_to(Stopping));
        assert!(Running.can_transition_to(Updating));
        assert!(Exiting.can_transition_to(Stopped));
        assert!(Stopping.can_transition_to(Crashed));
        assert!(Updating.can_transition_to(UpdateFailed));
        assert!(Updating.can_transition_to(Crashed));
        assert!(!Stopped.can_transition_to(Running));
        assert!(!Updating.can_transition_to(Running));
    }

    #[test]
    fn child_and_tls_expectations_match_invariants() {
        assert!(Starting.expects_child());
        assert!(!Stopped.expects_child());
        assert!(Running.expects_tls());
        assert!(!Starting.expects_tls());
        assert!(!Stopped.expects_tls());
    }
}
