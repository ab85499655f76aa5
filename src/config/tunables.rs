//! Shared tunable configuration read by the decision cycle and the coordinator.
//!
//! Every field is an independent atomic. Readers take relaxed loads and never
//! lock; a cycle may observe a mix of old and new values while an operator
//! write is in flight.
//! Writers go through [`Tunables::update`], which serializes writes so the
//! `min_active_units <= max_active_units` invariant cannot be broken by two
//! racing cross-field writes.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Lower bound for the sampling period in milliseconds.
pub const MIN_SAMPLING_PERIOD_MS: u32 = 10;
/// Upper bound for the sampling period in milliseconds.
pub const MAX_SAMPLING_PERIOD_MS: u32 = 10_000;
/// Upper bound for either hysteresis cycle count.
pub const MAX_HYSTERESIS_CYCLES: u32 = 6;

const DEFAULT_SAMPLING_PERIOD_MS: u32 = 50;
const DEFAULT_MIN_ACTIVE_UNITS: u32 = 2;
const DEFAULT_SCALE_UP_PERCENT: u32 = 60;
const DEFAULT_SCALE_DOWN_PERCENT: u32 = 40;
const DEFAULT_CYCLES_UP: u32 = 2;
const DEFAULT_CYCLES_DOWN: u32 = 2;

/// Plain copy of every tunable, used for configuration documents and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunablesSnapshot {
    /// Delay between decision cycles.
    pub sampling_period_ms: u32,
    /// Whether suspend collapses the pool to the primary unit.
    pub collapse_on_idle: bool,
    /// Upper bound on concurrently active units.
    pub max_active_units: u32,
    /// Lower bound on concurrently active units.
    pub min_active_units: u32,
    /// Frequency threshold (% of max) that triggers scale-up.
    pub scale_up_percent: u32,
    /// Frequency threshold (% of max) that triggers scale-down.
    pub scale_down_percent: u32,
    /// Consecutive cycles required before a scale-up.
    pub cycles_up_required: u32,
    /// Consecutive cycles required before a scale-down.
    pub cycles_down_required: u32,
}

impl TunablesSnapshot {
    /// Defaults for a pool of the given capacity.
    #[must_use]
    pub fn defaults_for(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            sampling_period_ms: DEFAULT_SAMPLING_PERIOD_MS,
            collapse_on_idle: true,
            max_active_units: capacity,
            min_active_units: DEFAULT_MIN_ACTIVE_UNITS.min(capacity),
            scale_up_percent: DEFAULT_SCALE_UP_PERCENT,
            scale_down_percent: DEFAULT_SCALE_DOWN_PERCENT,
            cycles_up_required: DEFAULT_CYCLES_UP,
            cycles_down_required: DEFAULT_CYCLES_DOWN,
        }
    }

    /// Validate all fields against their bounds for a pool of `capacity` units.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first field that is out of bounds.
    pub fn validate(&self, capacity: u32) -> Result<(), String> {
        check_range(
            "sampling_period_ms",
            self.sampling_period_ms,
            MIN_SAMPLING_PERIOD_MS,
            MAX_SAMPLING_PERIOD_MS,
        )?;
        check_range("min_active_units", self.min_active_units, 1, self.max_active_units)?;
        check_range("max_active_units", self.max_active_units, self.min_active_units, capacity)?;
        check_range("scale_up_percent", self.scale_up_percent, 1, 100)?;
        check_range("scale_down_percent", self.scale_down_percent, 1, 100)?;
        check_range("cycles_up_required", self.cycles_up_required, 1, MAX_HYSTERESIS_CYCLES)?;
        check_range("cycles_down_required", self.cycles_down_required, 1, MAX_HYSTERESIS_CYCLES)?;
        Ok(())
    }
}

fn check_range(name: &str, value: u32, low: u32, high: u32) -> Result<(), String> {
    if value < low || value > high {
        return Err(format!("{name} must be within {low}..={high}, got {value}"));
    }
    Ok(())
}

/// Live tunables shared between the controller threads and the parameter surface.
#[derive(Debug)]
pub struct Tunables {
    capacity: u32,
    sampling_period_ms: AtomicU32,
    collapse_on_idle: AtomicBool,
    max_active_units: AtomicU32,
    min_active_units: AtomicU32,
    scale_up_percent: AtomicU32,
    scale_down_percent: AtomicU32,
    cycles_up_required: AtomicU32,
    cycles_down_required: AtomicU32,
    write_guard: Mutex<()>,
}

macro_rules! load {
    ($(#[$doc:meta] $name:ident: $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            #[must_use]
            pub fn $name(&self) -> $ty {
                self.$name.load(Ordering::Relaxed)
            }
        )*
    };
}

impl Tunables {
    /// Build live tunables from a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns the validation message if `snapshot` is out of bounds for `capacity`.
    pub fn new(snapshot: TunablesSnapshot, capacity: u32) -> Result<Self, String> {
        snapshot.validate(capacity)?;
        Ok(Self {
            capacity,
            sampling_period_ms: AtomicU32::new(snapshot.sampling_period_ms),
            collapse_on_idle: AtomicBool::new(snapshot.collapse_on_idle),
            max_active_units: AtomicU32::new(snapshot.max_active_units),
            min_active_units: AtomicU32::new(snapshot.min_active_units),
            scale_up_percent: AtomicU32::new(snapshot.scale_up_percent),
            scale_down_percent: AtomicU32::new(snapshot.scale_down_percent),
            cycles_up_required: AtomicU32::new(snapshot.cycles_up_required),
            cycles_down_required: AtomicU32::new(snapshot.cycles_down_required),
            write_guard: Mutex::new(()),
        })
    }

    /// Defaults for a pool of the given capacity.
    #[must_use]
    pub fn with_defaults(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self::new(TunablesSnapshot::defaults_for(capacity), capacity)
            .unwrap_or_else(|_| unreachable!("defaults are always within bounds"))
    }

    /// Capacity of the pool these tunables were validated against.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    load! {
        /// Delay between decision cycles in milliseconds.
        sampling_period_ms: u32,
        /// Whether suspend collapses the pool to the primary unit.
        collapse_on_idle: bool,
        /// Upper bound on concurrently active units.
        max_active_units: u32,
        /// Lower bound on concurrently active units.
        min_active_units: u32,
        /// Scale-up threshold in percent of the maximum frequency.
        scale_up_percent: u32,
        /// Scale-down threshold in percent of the maximum frequency.
        scale_down_percent: u32,
        /// Cycles required before a scale-up.
        cycles_up_required: u32,
        /// Cycles required before a scale-down.
        cycles_down_required: u32,
    }

    /// Copy all fields into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TunablesSnapshot {
        TunablesSnapshot {
            sampling_period_ms: self.sampling_period_ms(),
            collapse_on_idle: self.collapse_on_idle(),
            max_active_units: self.max_active_units(),
            min_active_units: self.min_active_units(),
            scale_up_percent: self.scale_up_percent(),
            scale_down_percent: self.scale_down_percent(),
            cycles_up_required: self.cycles_up_required(),
            cycles_down_required: self.cycles_down_required(),
        }
    }

    /// Apply a modification to a copy of the current values, validate the
    /// result, and publish it. Nothing is written if `modify` or validation fails.
    ///
    /// # Errors
    ///
    /// Returns the message from `modify` or from validation.
    pub fn update<F>(&self, modify: F) -> Result<TunablesSnapshot, String>
    where
        F: FnOnce(&mut TunablesSnapshot) -> Result<(), String>,
    {
        let _guard = self.write_guard.lock();
        let current = self.snapshot();
        let mut next = current;
        modify(&mut next)?;
        next.validate(self.capacity)?;
        self.store_changed(&current, &next);
        Ok(next)
    }

    fn store_changed(&self, current: &TunablesSnapshot, next: &TunablesSnapshot) {
        let fields = [
            (&self.sampling_period_ms, current.sampling_period_ms, next.sampling_period_ms),
            (&self.max_active_units, current.max_active_units, next.max_active_units),
            (&self.min_active_units, current.min_active_units, next.min_active_units),
            (&self.scale_up_percent, current.scale_up_percent, next.scale_up_percent),
            (&self.scale_down_percent, current.scale_down_percent, next.scale_down_percent),
            (&self.cycles_up_required, current.cycles_up_required, next.cycles_up_required),
            (&self.cycles_down_required, current.cycles_down_required, next.cycles_down_required),
        ];
        for (slot, old, new) in fields {
            if old != new {
                slot.store(new, Ordering::Relaxed);
            }
        }
        if current.collapse_on_idle != next.collapse_on_idle {
            self.collapse_on_idle.store(next.collapse_on_idle, Ordering::Relaxed);
        }
    }
}
