//! Audit sink implementations.
//!
//! Records controller lifecycle notices and scale actions so operators and
//! tests can inspect what the controller did without scraping logs.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::pool::UnitId;
use crate::util::clock::now_ms;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Controller enabled.
    Started,
    /// Controller disabled.
    Stopped,
    /// Activity went to suspended; sampling paused.
    Suspended,
    /// Activity went back to active; sampling resumed.
    Resumed,
    /// A unit was brought online by the decision cycle.
    ScaleUp,
    /// A unit was taken offline by the decision cycle.
    ScaleDown,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Suspended => "suspended",
            Self::Resumed => "resumed",
            Self::ScaleUp => "scale_up",
            Self::ScaleDown => "scale_down",
        };
        f.write_str(label)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Action taken.
    pub action: AuditAction,
    /// Unit affected, for scale actions.
    pub unit: Option<UnitId>,
    /// Active-unit count right after the action.
    pub active_units: u32,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit log. Once `retain` events are held, each new
/// event evicts the oldest one.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    retain: usize,
    evicted: u64,
}

impl InMemoryAuditSink {
    /// Sink keeping at most `retain` events. Zero keeps nothing.
    #[must_use]
    pub fn new(retain: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(retain),
            retain,
            evicted: 0,
        }
    }

    /// Retained events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Retained events with the given action, oldest first.
    #[must_use]
    pub fn events_of(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events.iter().filter(|e| e.action == action).cloned().collect()
    }

    /// Events dropped because the log was full.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        self.events.push_back(event);
        while self.events.len() > self.retain {
            self.events.pop_front();
            self.evicted += 1;
        }
    }
}

/// Shared sink: the controller records through the lock while the owner
/// keeps a handle to read events back.
impl<S: AuditSink> AuditSink for std::sync::Arc<parking_lot::Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Sink that logs every event under the `corescale::audit` target. Scale
/// actions go out at debug, lifecycle changes at info.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        match (event.action, event.unit) {
            (AuditAction::ScaleUp | AuditAction::ScaleDown, Some(unit)) => tracing::debug!(
                target: "corescale::audit",
                action = %event.action,
                unit,
                active_units = event.active_units,
                "scale action"
            ),
            _ => tracing::info!(
                target: "corescale::audit",
                action = %event.action,
                active_units = event.active_units,
                "controller {}",
                event.action
            ),
        }
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_audit_event(action: AuditAction, unit: Option<UnitId>, active_units: u32) -> AuditEvent {
    AuditEvent {
        action,
        unit,
        active_units,
        created_at_ms: now_ms(),
    }
}
