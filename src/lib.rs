//! # corescale
//!
//! Frequency-driven CPU core hotplug controller.
//!
//! A decision cycle runs every sampling period. It reads the current
//! frequency of every active unit, compares the fastest and slowest readings
//! against thresholds derived from the maximum frequency, and brings at most
//! one unit online or offline per cycle. Hysteresis counters keep the pool
//! from flapping. When the system goes idle the pool can collapse to the
//! primary unit, and it is restored on resume.
//!
//! ## Components
//!
//! - [`core::Sampler`]: one decision cycle over a [`core::CpuPool`] and a
//!   [`core::FrequencyProbe`]
//! - [`core::ActivityCoordinator`]: suspend/resume state machine
//! - [`core::Controller`]: enable/disable lifecycle, the periodic task and
//!   the event thread
//! - [`config::Tunables`]: lock-free shared tunables behind a declarative
//!   parameter table
//! - [`infra`]: sysfs, simulated and channel-based adapters
//!
//! ## Example
//!
//! ```rust,no_run
//! use corescale::builders::build_sysfs_controller;
//! use corescale::config::ControllerConfig;
//! use corescale::core::ActivityEvent;
//!
//! # fn main() -> anyhow::Result<()> {
//! corescale::util::init_tracing();
//! let cfg = ControllerConfig::from_env()?;
//! let (controller, notifier) = build_sysfs_controller(&cfg)?;
//! controller.set_param("max_active_units", "4")?;
//! if !controller.is_enabled() {
//!     controller.enable()?;
//! }
//! notifier.notify(ActivityEvent::Suspended);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Control loop: policy, sampler, coordinator and controller.
pub mod core;
/// Tunables, parameter table and configuration documents.
pub mod config;
/// Builders to construct controllers from configuration.
pub mod builders;
/// Pool, probe and notifier adapters.
pub mod infra;
/// Periodic task, status surface and runtime bridges.
pub mod runtime;
/// Shared utilities.
pub mod util;
