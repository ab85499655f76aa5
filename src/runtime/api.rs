//! Operator-facing status and parameter models.

use serde::{Deserialize, Serialize};

use crate::config::TunablesSnapshot;
use crate::core::{
    ActivityNotifier, Controller, ControllerStats, CoordinatorState, CpuPool, FrequencyProbe,
    UnitId,
};

/// Controller status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Whether the control loop is running.
    pub enabled: bool,
    /// Coordinator state.
    pub state: CoordinatorState,
    /// Units in the pool.
    pub capacity: u32,
    /// Currently active units, ascending.
    pub active_units: Vec<UnitId>,
    /// Current hysteresis counter.
    pub cycle_counter: u32,
    /// Tunables in effect.
    pub tunables: TunablesSnapshot,
    /// Counters.
    pub stats: ControllerStats,
}

/// One parameter and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    /// Parameter name.
    pub name: String,
    /// Current value.
    pub value: u32,
}

/// Build a status snapshot.
pub fn status<P, F, N>(controller: &Controller<P, F, N>) -> ControllerStatus
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    ControllerStatus {
        enabled: controller.is_enabled(),
        state: controller.state(),
        capacity: controller.pool().capacity(),
        active_units: controller.pool().active_units(),
        cycle_counter: controller.cycle_counter(),
        tunables: controller.tunables().snapshot(),
        stats: controller.stats(),
    }
}

/// List every parameter with its current value.
pub fn list_params<P, F, N>(controller: &Controller<P, F, N>) -> Vec<ParamEntry>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    controller
        .params()
        .into_iter()
        .map(|(name, value)| ParamEntry {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// Write a parameter and return its new value.
pub fn update_param<P, F, N>(
    controller: &Controller<P, F, N>,
    name: &str,
    raw: &str,
) -> Result<ParamEntry, String>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    controller.set_param(name, raw).map_err(|e| e.to_string())?;
    let value = controller.param(name).map_err(|e| e.to_string())?;
    Ok(ParamEntry {
        name: name.to_string(),
        value,
    })
}
