//! Activity coordinator: suspend/resume state machine and pool collapse.
//!
//! The coordinator turns the two-valued activity signal into pool-wide
//! transitions. Pausing and resuming the decision cycle is done by the
//! controller, which owns the periodic task; this module decides *whether*
//! a transition happens and performs the pool side of it.

use std::fmt;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::pool::{CpuPool, PRIMARY_UNIT};
use crate::core::ControllerError;

/// System activity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    /// The system is in use.
    Active,
    /// The system is idle or suspended.
    Suspended,
}

/// Source of activity transitions.
///
/// The controller registers a channel sender when it starts and unregisters
/// when it stops. Implementations must deliver each transition once, in order,
/// and drop their sender on `unregister`.
pub trait ActivityNotifier: Send + Sync {
    /// Start delivering events to `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Startup`] when the source cannot be subscribed.
    fn register(&self, sender: Sender<ActivityEvent>) -> Result<(), ControllerError>;
    /// Stop delivering events and release the sender.
    fn unregister(&self);
}

impl<T: ActivityNotifier + ?Sized> ActivityNotifier for std::sync::Arc<T> {
    fn register(&self, sender: Sender<ActivityEvent>) -> Result<(), ControllerError> {
        (**self).register(sender)
    }

    fn unregister(&self) {
        (**self).unregister();
    }
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    /// Normal operation, decision cycle active.
    Running,
    /// Decision cycle paused, pool reduced.
    Collapsed,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Collapsed => f.write_str("collapsed"),
        }
    }
}

/// A state change the controller must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Running -> Collapsed.
    Suspend,
    /// Collapsed -> Running.
    Resume,
}

/// Tracks the coordinator state across events.
#[derive(Debug)]
pub struct ActivityCoordinator {
    state: CoordinatorState,
}

impl Default for ActivityCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityCoordinator {
    /// Coordinator in the `Running` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CoordinatorState::Running,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Back to `Running`, used when the controller is (re)enabled.
    pub fn reset(&mut self) {
        self.state = CoordinatorState::Running;
    }

    /// Advance the state machine. Returns `None` for an event that matches the
    /// current state.
    pub fn on_event(&mut self, event: ActivityEvent) -> Option<Transition> {
        match (self.state, event) {
            (CoordinatorState::Running, ActivityEvent::Suspended) => {
                self.state = CoordinatorState::Collapsed;
                Some(Transition::Suspend)
            }
            (CoordinatorState::Collapsed, ActivityEvent::Active) => {
                self.state = CoordinatorState::Running;
                Some(Transition::Resume)
            }
            _ => None,
        }
    }
}

/// Deactivate every active non-primary unit. Best-effort: failures are
/// logged and skipped. Returns the number of failed requests.
pub fn collapse_pool<P: CpuPool + ?Sized>(pool: &P) -> usize {
    let mut failures = 0;
    for unit in pool.active_units().into_iter().filter(|&u| u != PRIMARY_UNIT) {
        if let Err(e) = pool.deactivate(unit) {
            warn!(unit, error = %e, "collapse: failed to deactivate unit");
            failures += 1;
        }
    }
    failures
}

/// Activate inactive units, lowest index first, until `max_active` units are
/// active or the pool is exhausted. Returns the number of failed requests.
pub fn restore_pool<P: CpuPool + ?Sized>(pool: &P, max_active: u32) -> usize {
    let mut active = pool.active_units();
    let mut candidates = pool.units().into_iter();
    let mut failures = 0;
    while (active.len() as u64) < u64::from(max_active) {
        let Some(unit) = candidates.find(|unit| active.binary_search(unit).is_err()) else {
            break;
        };
        match pool.activate(unit) {
            Ok(()) => {
                if let Err(pos) = active.binary_search(&unit) {
                    active.insert(pos, unit);
                }
            }
            Err(e) => {
                warn!(unit, error = %e, "restore: failed to activate unit");
                failures += 1;
            }
        }
    }
    failures
}
