//! Declarative parameter table for the operator-facing surface.
//!
//! Each entry maps a parameter name to a getter, a setter and its bounds.
//! Bounds for `min_active_units` and `max_active_units` depend on each other
//! and on the pool capacity, so they are computed from the current snapshot.

use crate::config::tunables::{
    TunablesSnapshot, MAX_HYSTERESIS_CYCLES, MAX_SAMPLING_PERIOD_MS, MIN_SAMPLING_PERIOD_MS,
};
use crate::config::Tunables;
use crate::core::ControllerError;

/// Name of the lifecycle toggle, handled by the controller rather than the table.
pub const ENABLED_PARAM: &str = "enabled";

/// One row of the parameter table.
pub struct ParamSpec {
    /// Parameter name as exposed to operators.
    pub name: &'static str,
    get: fn(&TunablesSnapshot) -> u32,
    set: fn(&mut TunablesSnapshot, u32),
    bounds: fn(&TunablesSnapshot, u32) -> (u32, u32),
}

impl ParamSpec {
    /// Inclusive bounds for this parameter given the current values and capacity.
    #[must_use]
    pub fn bounds(&self, current: &TunablesSnapshot, capacity: u32) -> (u32, u32) {
        (self.bounds)(current, capacity)
    }

    /// Read this parameter from live tunables.
    #[must_use]
    pub fn read(&self, tunables: &Tunables) -> u32 {
        (self.get)(&tunables.snapshot())
    }

    /// Set this parameter on a detached snapshot without bounds checks.
    pub fn apply(&self, snapshot: &mut TunablesSnapshot, value: u32) {
        (self.set)(snapshot, value);
    }

    /// Validate and publish a new value. The tunables stay untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidArgument`] when `value` is out of bounds.
    pub fn write(&self, tunables: &Tunables, value: u32) -> Result<(), ControllerError> {
        let capacity = tunables.capacity();
        tunables
            .update(|snapshot| {
                let (low, high) = (self.bounds)(snapshot, capacity);
                if value < low || value > high {
                    return Err(format!("must be within {low}..={high}, got {value}"));
                }
                (self.set)(snapshot, value);
                Ok(())
            })
            .map(|_| ())
            .map_err(|msg| ControllerError::InvalidArgument(format!("{}: {msg}", self.name)))
    }
}

/// The full parameter table, in display order.
pub static PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "sampling_period_ms",
        get: |t| t.sampling_period_ms,
        set: |t, v| t.sampling_period_ms = v,
        bounds: |_, _| (MIN_SAMPLING_PERIOD_MS, MAX_SAMPLING_PERIOD_MS),
    },
    ParamSpec {
        name: "collapse_on_idle",
        get: |t| u32::from(t.collapse_on_idle),
        set: |t, v| t.collapse_on_idle = v != 0,
        bounds: |_, _| (0, 1),
    },
    ParamSpec {
        name: "min_active_units",
        get: |t| t.min_active_units,
        set: |t, v| t.min_active_units = v,
        bounds: |t, _| (1, t.max_active_units),
    },
    ParamSpec {
        name: "max_active_units",
        get: |t| t.max_active_units,
        set: |t, v| t.max_active_units = v,
        bounds: |t, capacity| (t.min_active_units, capacity),
    },
    ParamSpec {
        name: "scale_up_percent",
        get: |t| t.scale_up_percent,
        set: |t, v| t.scale_up_percent = v,
        bounds: |_, _| (1, 100),
    },
    ParamSpec {
        name: "scale_down_percent",
        get: |t| t.scale_down_percent,
        set: |t, v| t.scale_down_percent = v,
        bounds: |_, _| (1, 100),
    },
    ParamSpec {
        name: "cycles_up_required",
        get: |t| t.cycles_up_required,
        set: |t, v| t.cycles_up_required = v,
        bounds: |_, _| (1, MAX_HYSTERESIS_CYCLES),
    },
    ParamSpec {
        name: "cycles_down_required",
        get: |t| t.cycles_down_required,
        set: |t, v| t.cycles_down_required = v,
        bounds: |_, _| (1, MAX_HYSTERESIS_CYCLES),
    },
];

/// Look up a table entry by name.
#[must_use]
pub fn find_param(name: &str) -> Option<&'static ParamSpec> {
    PARAMS.iter().find(|spec| spec.name == name)
}

/// Parse a raw operator value. Surrounding whitespace (including the trailing
/// newline of a shell `echo`) is ignored.
///
/// # Errors
///
/// Returns [`ControllerError::InvalidArgument`] when `raw` is not an unsigned integer.
pub fn parse_value(name: &str, raw: &str) -> Result<u32, ControllerError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ControllerError::InvalidArgument(format!("{name}: cannot parse `{}`", raw.trim())))
}
