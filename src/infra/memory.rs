//! In-memory simulated pool for tests, benchmarks and dry runs.
//!
//! Implements both [`CpuPool`] and [`FrequencyProbe`] over plain vectors,
//! with switches to inject probe and pool-operation failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::core::pool::{CpuPool, FrequencyProbe, UnitId, PRIMARY_UNIT};
use crate::core::ControllerError;

#[derive(Debug)]
struct SimState {
    online: Vec<bool>,
    rates: Vec<u64>,
    failing_probes: HashSet<UnitId>,
}

/// Simulated compute-unit pool with settable per-unit frequencies.
#[derive(Debug)]
pub struct SimulatedPool {
    capacity: u32,
    max_rate: AtomicU64,
    state: Mutex<SimState>,
    fail_ops: AtomicBool,
    activations: AtomicU64,
    deactivations: AtomicU64,
}

impl SimulatedPool {
    /// Pool of `capacity` units, all active, all idle, with the given max rate.
    #[must_use]
    pub fn new(capacity: u32, max_rate: u64) -> Self {
        let len = capacity as usize;
        Self {
            capacity,
            max_rate: AtomicU64::new(max_rate),
            state: Mutex::new(SimState {
                online: vec![true; len],
                rates: vec![0; len],
                failing_probes: HashSet::new(),
            }),
            fail_ops: AtomicBool::new(false),
            activations: AtomicU64::new(0),
            deactivations: AtomicU64::new(0),
        }
    }

    /// Make exactly `units` active. The primary unit is always kept active.
    pub fn set_active(&self, units: &[UnitId]) {
        let mut state = self.state.lock();
        for (unit, online) in (0..).zip(state.online.iter_mut()) {
            *online = unit == PRIMARY_UNIT || units.contains(&unit);
        }
    }

    /// Set the frequency reported for one unit.
    pub fn set_rate(&self, unit: UnitId, rate: u64) {
        if let Some(slot) = self.state.lock().rates.get_mut(unit as usize) {
            *slot = rate;
        }
    }

    /// Set the frequency reported for every unit.
    pub fn set_all_rates(&self, rate: u64) {
        self.state.lock().rates.iter_mut().for_each(|r| *r = rate);
    }

    /// Change the maximum attainable frequency.
    pub fn set_max_rate(&self, rate: u64) {
        self.max_rate.store(rate, Ordering::Relaxed);
    }

    /// Make frequency queries for `unit` fail (or succeed again).
    pub fn fail_probe(&self, unit: UnitId, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_probes.insert(unit);
        } else {
            state.failing_probes.remove(&unit);
        }
    }

    /// Make every activate/deactivate request fail (or succeed again).
    pub fn fail_pool_ops(&self, failing: bool) {
        self.fail_ops.store(failing, Ordering::Relaxed);
    }

    /// Number of active units.
    #[must_use]
    pub fn active_count(&self) -> u32 {
        let count = self.state.lock().online.iter().filter(|&&on| on).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Successful activations of previously inactive units.
    #[must_use]
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    /// Successful deactivations of previously active units.
    #[must_use]
    pub fn deactivations(&self) -> u64 {
        self.deactivations.load(Ordering::Relaxed)
    }

    fn set_online(&self, unit: UnitId, online: bool) -> Result<(), ControllerError> {
        if self.fail_ops.load(Ordering::Relaxed) {
            return Err(ControllerError::Pool(format!("unit {unit}: injected failure")));
        }
        let mut state = self.state.lock();
        let slot = state
            .online
            .get_mut(unit as usize)
            .ok_or_else(|| ControllerError::Pool(format!("unit {unit} out of range")))?;
        if *slot != online {
            *slot = online;
            let counter = if online { &self.activations } else { &self.deactivations };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl CpuPool for SimulatedPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn active_units(&self) -> Vec<UnitId> {
        self.state
            .lock()
            .online
            .iter()
            .zip(0..)
            .filter_map(|(&on, unit)| on.then_some(unit))
            .collect()
    }

    fn activate(&self, unit: UnitId) -> Result<(), ControllerError> {
        self.set_online(unit, true)
    }

    fn deactivate(&self, unit: UnitId) -> Result<(), ControllerError> {
        if unit == PRIMARY_UNIT {
            return Err(ControllerError::Pool("primary unit cannot be deactivated".into()));
        }
        self.set_online(unit, false)
    }
}

impl FrequencyProbe for SimulatedPool {
    fn frequency(&self, unit: UnitId) -> Result<u64, ControllerError> {
        let state = self.state.lock();
        if state.failing_probes.contains(&unit) {
            return Err(ControllerError::Probe(format!("unit {unit}: injected failure")));
        }
        state
            .rates
            .get(unit as usize)
            .copied()
            .ok_or_else(|| ControllerError::Probe(format!("unit {unit} out of range")))
    }

    fn max_frequency(&self, _unit: UnitId) -> Result<u64, ControllerError> {
        Ok(self.max_rate.load(Ordering::Relaxed))
    }
}
