//! Scale policy: rate aggregation and the hysteresis decision.
//!
//! Pure functions with no pool or probe access, so the whole decision can be
//! exercised offline with synthetic frequency samples.

use serde::{Deserialize, Serialize};

use crate::core::pool::{UnitId, PRIMARY_UNIT};

/// Frequency reading for one active unit during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSample {
    /// Unit the reading belongs to.
    pub unit: UnitId,
    /// Observed frequency in kHz. Zero when the probe gave no signal.
    pub rate: u64,
}

/// Aggregate rates computed from one cycle of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSummary {
    /// Lowest rate among all active units, primary included.
    pub slow_rate: u64,
    /// Slowest non-primary unit, the only kind of unit eligible for removal.
    pub slow_unit: Option<UnitId>,
    /// Highest rate among non-primary units, or the primary rate when the
    /// primary is the only active unit.
    pub fast_rate: u64,
}

/// Thresholds and bounds a decision is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyLimits {
    /// Rate above which every unit counts as busy.
    pub up_rate: u64,
    /// Rate below which every non-primary unit counts as idle.
    pub down_rate: u64,
    /// Upper bound on active units.
    pub max_active: u32,
    /// Lower bound on active units.
    pub min_active: u32,
    /// Cycles required before scaling up.
    pub cycles_up: u32,
    /// Cycles required before scaling down.
    pub cycles_down: u32,
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Bring one more unit online.
    ScaleUp,
    /// Take the given unit offline.
    ScaleDown(UnitId),
    /// Leave the pool as it is.
    Hold,
}

/// `percent` of `max_rate`, in integer arithmetic.
#[must_use]
pub fn threshold_rate(percent: u32, max_rate: u64) -> u64 {
    u64::from(percent).saturating_mul(max_rate) / 100
}

/// Aggregate the samples of one cycle.
///
/// `primary_rate` is the primary unit's reading; any primary entry inside
/// `samples` is ignored. Samples are scanned in the given order and ties for
/// the slowest unit go to the later sample.
#[must_use]
pub fn summarize(primary_rate: u64, samples: &[UnitSample]) -> RateSummary {
    let mut slow_rate = u64::MAX;
    let mut slow_unit = None;
    let mut fast_rate: Option<u64> = None;

    for sample in samples.iter().filter(|s| s.unit != PRIMARY_UNIT) {
        if sample.rate <= slow_rate {
            slow_rate = sample.rate;
            slow_unit = Some(sample.unit);
        }
        fast_rate = Some(fast_rate.map_or(sample.rate, |f| f.max(sample.rate)));
    }

    RateSummary {
        slow_rate: slow_rate.min(primary_rate),
        slow_unit,
        fast_rate: fast_rate.unwrap_or(primary_rate),
    }
}

/// Apply the scale policy.
///
/// `cycle` is the hysteresis counter after incrementing it for this cycle.
#[must_use]
pub fn decide(summary: &RateSummary, active_count: u32, cycle: u32, limits: &PolicyLimits) -> Decision {
    if summary.slow_rate > limits.up_rate {
        if active_count < limits.max_active && cycle >= limits.cycles_up {
            return Decision::ScaleUp;
        }
    } else if let Some(unit) = summary.slow_unit {
        if summary.fast_rate < limits.down_rate
            && active_count > limits.min_active
            && cycle >= limits.cycles_down
        {
            return Decision::ScaleDown(unit);
        }
    }
    Decision::Hold
}
