//! Capabilities the controller consumes: the unit pool and the frequency probe.

use std::sync::Arc;

use crate::core::ControllerError;

/// Index of a compute unit inside the pool.
pub type UnitId = u32;

/// The distinguished unit that is always kept active.
pub const PRIMARY_UNIT: UnitId = 0;

/// Abstraction over a fixed-capacity pool of compute units.
///
/// Implementations must treat `activate` on an active unit and `deactivate`
/// on an inactive unit as no-ops.
pub trait CpuPool: Send + Sync {
    /// One past the highest unit index. Fixed for the lifetime of the pool.
    fn capacity(&self) -> u32;
    /// Every unit that exists, ascending. Pools with holes in their index
    /// range override this; the default is `0..capacity`.
    fn units(&self) -> Vec<UnitId> {
        (0..self.capacity()).collect()
    }
    /// Currently active units in ascending order.
    fn active_units(&self) -> Vec<UnitId>;
    /// Bring a unit online.
    fn activate(&self, unit: UnitId) -> Result<(), ControllerError>;
    /// Take a unit offline.
    fn deactivate(&self, unit: UnitId) -> Result<(), ControllerError>;
}

/// Abstraction over per-unit frequency readings (kHz).
pub trait FrequencyProbe: Send + Sync {
    /// Current operating frequency of a unit.
    fn frequency(&self, unit: UnitId) -> Result<u64, ControllerError>;
    /// Maximum attainable frequency of a unit.
    fn max_frequency(&self, unit: UnitId) -> Result<u64, ControllerError>;
}

impl<T: CpuPool + ?Sized> CpuPool for Arc<T> {
    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn units(&self) -> Vec<UnitId> {
        (**self).units()
    }

    fn active_units(&self) -> Vec<UnitId> {
        (**self).active_units()
    }

    fn activate(&self, unit: UnitId) -> Result<(), ControllerError> {
        (**self).activate(unit)
    }

    fn deactivate(&self, unit: UnitId) -> Result<(), ControllerError> {
        (**self).deactivate(unit)
    }
}

impl<T: FrequencyProbe + ?Sized> FrequencyProbe for Arc<T> {
    fn frequency(&self, unit: UnitId) -> Result<u64, ControllerError> {
        (**self).frequency(unit)
    }

    fn max_frequency(&self, unit: UnitId) -> Result<u64, ControllerError> {
        (**self).max_frequency(unit)
    }
}

/// Lowest unit of `units` that is not in `active` (which must be sorted).
#[must_use]
pub fn first_inactive(units: &[UnitId], active: &[UnitId]) -> Option<UnitId> {
    units.iter().copied().find(|unit| active.binary_search(unit).is_err())
}

/// Activate every unit of the pool. Returns the number of failed requests.
pub fn activate_all<P: CpuPool + ?Sized>(pool: &P) -> usize {
    let active = pool.active_units();
    let mut failures = 0;
    for unit in pool.units() {
        if active.binary_search(&unit).is_ok() {
            continue;
        }
        if let Err(e) = pool.activate(unit) {
            tracing::warn!(unit, error = %e, "failed to activate unit");
            failures += 1;
        }
    }
    failures
}
