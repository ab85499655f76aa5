//! Shared utilities: clock, cpu range lists and tracing setup.

pub mod clock;
pub mod cpulist;
pub mod telemetry;

pub use clock::*;
pub use cpulist::*;
pub use telemetry::*;
