//! Builders that turn a [`ControllerConfig`] into a running controller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::ControllerConfig;
use crate::core::{
    ActivityNotifier, AppResult, Controller, ControllerError, CpuPool, FrequencyProbe,
};
use crate::infra::{ChannelNotifier, SysfsCpuPool, SysfsFrequencyProbe};

/// Controller wired to the sysfs adapters.
pub type SysfsController = Controller<SysfsCpuPool, SysfsFrequencyProbe, Arc<ChannelNotifier>>;

/// Build a controller over the given adapters. Enables it when `cfg.enabled`.
///
/// # Errors
///
/// - [`ControllerError::InvalidConfig`] when the configuration does not
///   validate against the pool capacity
/// - [`ControllerError::Startup`] when `cfg.enabled` and enabling fails
pub fn build_controller<P, F, N>(
    cfg: &ControllerConfig,
    pool: P,
    probe: F,
    notifier: N,
) -> Result<Controller<P, F, N>, ControllerError>
where
    P: CpuPool + 'static,
    F: FrequencyProbe + 'static,
    N: ActivityNotifier,
{
    cfg.validate()
        .map_err(|e| ControllerError::InvalidConfig(format!("config invalid: {e}")))?;
    let tunables = cfg
        .tunables_for(pool.capacity())
        .map_err(|e| ControllerError::InvalidConfig(format!("tunables invalid: {e}")))?;

    let controller = Controller::new(
        pool,
        probe,
        notifier,
        Arc::new(tunables),
        Duration::from_millis(cfg.initial_delay_ms),
    )?;
    if cfg.enabled {
        controller.enable()?;
    }
    Ok(controller)
}

/// Build a controller over `cfg.sysfs_root`. Returns the notifier the caller
/// feeds activity events into.
///
/// # Errors
///
/// Fails when the sysfs tree cannot be opened or the controller cannot be built.
pub fn build_sysfs_controller(
    cfg: &ControllerConfig,
) -> AppResult<(SysfsController, Arc<ChannelNotifier>)> {
    let pool = SysfsCpuPool::open(&cfg.sysfs_root).context("opening sysfs cpu pool")?;
    let probe = SysfsFrequencyProbe::new(&cfg.sysfs_root);
    let notifier = Arc::new(ChannelNotifier::new());
    let controller = build_controller(cfg, pool, probe, Arc::clone(&notifier))
        .context("building sysfs controller")?;
    Ok((controller, notifier))
}
