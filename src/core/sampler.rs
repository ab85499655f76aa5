//! Sampler/decider: one decision cycle per period, at most one pool change.

use tracing::{debug, trace, warn};

use crate::config::Tunables;
use crate::core::policy::{self, Decision, PolicyLimits, RateSummary, UnitSample};
use crate::core::pool::{first_inactive, CpuPool, FrequencyProbe, UnitId, PRIMARY_UNIT};

/// What a cycle did to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    /// A unit was activated.
    Activated(UnitId),
    /// A unit was deactivated.
    Deactivated(UnitId),
    /// An activation or deactivation was requested and failed.
    Failed(Decision),
    /// Nothing changed.
    None,
}

/// Summary of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Hysteresis counter value the decision was made with.
    pub cycle: u32,
    /// Active units observed at the start of the cycle.
    pub active_before: u32,
    /// Aggregated rates.
    pub summary: RateSummary,
    /// Policy outcome.
    pub decision: Decision,
    /// Resulting pool action.
    pub action: CycleAction,
}

/// Decision-cycle state. Only the cycle mutates it.
#[derive(Debug, Default)]
pub struct Sampler {
    cycle: u32,
}

impl Sampler {
    /// Fresh sampler with the hysteresis counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { cycle: 0 }
    }

    /// Current hysteresis counter.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Run one decision cycle against `pool`.
    ///
    /// Probe failures count as a zero rate for this cycle only. A failed pool
    /// request is not retried; the next cycle starts over from the pool's
    /// actual membership.
    pub fn run_cycle<P, F>(&mut self, pool: &P, probe: &F, tunables: &Tunables) -> CycleReport
    where
        P: CpuPool + ?Sized,
        F: FrequencyProbe + ?Sized,
    {
        self.cycle = self.cycle.saturating_add(1);

        let max_rate = read_rate(probe.max_frequency(PRIMARY_UNIT), PRIMARY_UNIT);
        let limits = PolicyLimits {
            up_rate: policy::threshold_rate(tunables.scale_up_percent(), max_rate),
            down_rate: policy::threshold_rate(tunables.scale_down_percent(), max_rate),
            max_active: tunables.max_active_units(),
            min_active: tunables.min_active_units(),
            cycles_up: tunables.cycles_up_required(),
            cycles_down: tunables.cycles_down_required(),
        };

        let active = pool.active_units();
        let active_count = u32::try_from(active.len()).unwrap_or(u32::MAX);
        let primary_rate = read_rate(probe.frequency(PRIMARY_UNIT), PRIMARY_UNIT);
        let samples: Vec<UnitSample> = active
            .iter()
            .filter(|&&unit| unit != PRIMARY_UNIT)
            .map(|&unit| UnitSample {
                unit,
                rate: read_rate(probe.frequency(unit), unit),
            })
            .collect();

        let summary = policy::summarize(primary_rate, &samples);
        let decision = policy::decide(&summary, active_count, self.cycle, &limits);
        let cycle = self.cycle;

        let action = match decision {
            Decision::ScaleUp => match first_inactive(&pool.units(), &active) {
                Some(unit) => {
                    self.cycle = 0;
                    match pool.activate(unit) {
                        Ok(()) => CycleAction::Activated(unit),
                        Err(e) => {
                            warn!(unit, error = %e, "scale-up request failed");
                            CycleAction::Failed(decision)
                        }
                    }
                }
                None => CycleAction::None,
            },
            Decision::ScaleDown(unit) => {
                self.cycle = 0;
                match pool.deactivate(unit) {
                    Ok(()) => CycleAction::Deactivated(unit),
                    Err(e) => {
                        warn!(unit, error = %e, "scale-down request failed");
                        CycleAction::Failed(decision)
                    }
                }
            }
            Decision::Hold => CycleAction::None,
        };

        debug!(
            cycle,
            active = active_count,
            slow_rate = summary.slow_rate,
            fast_rate = summary.fast_rate,
            up_rate = limits.up_rate,
            down_rate = limits.down_rate,
            ?action,
            "decision cycle"
        );

        CycleReport {
            cycle,
            active_before: active_count,
            summary,
            decision,
            action,
        }
    }
}

fn read_rate(result: Result<u64, crate::core::ControllerError>, unit: UnitId) -> u64 {
    result.unwrap_or_else(|e| {
        trace!(unit, error = %e, "no frequency signal");
        0
    })
}
