//! Core control loop: pool abstractions, decision policy, sampler,
//! activity coordination and the controller lifecycle.

pub mod error;
pub mod pool;
pub mod policy;
pub mod sampler;
pub mod coordinator;
pub mod controller;
pub mod audit;

pub use error::{AppResult, ControllerError};
pub use pool::{activate_all, first_inactive, CpuPool, FrequencyProbe, UnitId, PRIMARY_UNIT};
pub use policy::{Decision, PolicyLimits, RateSummary, UnitSample};
pub use sampler::{CycleAction, CycleReport, Sampler};
pub use coordinator::{
    collapse_pool, restore_pool, ActivityCoordinator, ActivityEvent, ActivityNotifier,
    CoordinatorState, Transition,
};
pub use controller::{Controller, ControllerStats, DEFAULT_INITIAL_DELAY};
pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
