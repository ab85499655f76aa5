//! Linux sysfs adapters: CPU hotplug through `cpuN/online` and frequency
//! readings through `cpuN/cpufreq`.
//!
//! The root is configurable so the adapters can run against a fake tree.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::core::pool::{CpuPool, FrequencyProbe, UnitId, PRIMARY_UNIT};
use crate::core::{AppResult, ControllerError};
use crate::util::cpulist::parse_cpu_list;

/// Default sysfs cpu directory.
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

fn cpu_dir(root: &Path, unit: UnitId) -> PathBuf {
    root.join(format!("cpu{unit}"))
}

/// Hotplug pool backed by per-cpu `online` files.
///
/// Only cpus named in `present` belong to the pool; the list may have holes.
#[derive(Debug, Clone)]
pub struct SysfsCpuPool {
    root: PathBuf,
    present: Vec<UnitId>,
    capacity: u32,
}

impl SysfsCpuPool {
    /// Open the pool rooted at `root`, sizing it from the `present` list.
    /// Falls back to the number of logical cpus when `present` is unreadable.
    ///
    /// # Errors
    ///
    /// Fails when `root` is not a directory or `present` is malformed.
    pub fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("sysfs cpu root {} is not a directory", root.display());
        }
        let present = root.join("present");
        let units = match fs::read_to_string(&present) {
            Ok(list) => {
                let units = parse_cpu_list(&list)
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("malformed {}", present.display()))?;
                if units.is_empty() {
                    vec![PRIMARY_UNIT]
                } else {
                    units
                }
            }
            Err(e) => {
                let fallback = u32::try_from(num_cpus::get()).unwrap_or(u32::MAX).max(1);
                warn!(path = %present.display(), error = %e, fallback, "cpu list unreadable, using logical cpu count");
                (0..fallback).collect()
            }
        };
        let pool = Self::from_units(root, units)?;
        debug!(root = %pool.root.display(), capacity = pool.capacity, present = pool.present.len(), "sysfs cpu pool opened");
        Ok(pool)
    }

    /// Pool with an explicit capacity, skipping discovery. Every cpu below
    /// `capacity` is treated as present.
    #[must_use]
    pub fn with_capacity(root: impl Into<PathBuf>, capacity: u32) -> Self {
        Self {
            root: root.into(),
            present: (0..capacity).collect(),
            capacity,
        }
    }

    fn from_units(root: PathBuf, mut present: Vec<UnitId>) -> AppResult<Self> {
        present.sort_unstable();
        present.dedup();
        let capacity = match present.last() {
            Some(&max) => max
                .checked_add(1)
                .with_context(|| format!("cpu id {max} out of range"))?,
            None => 0,
        };
        Ok(Self {
            root,
            present,
            capacity,
        })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn online_path(&self, unit: UnitId) -> PathBuf {
        cpu_dir(&self.root, unit).join("online")
    }

    fn is_present(&self, unit: UnitId) -> bool {
        self.present.binary_search(&unit).is_ok()
    }

    /// A cpu whose directory exists but has no `online` file cannot be
    /// hot-unplugged and is online. A missing directory means no cpu.
    fn is_online(&self, unit: UnitId) -> bool {
        match fs::read_to_string(self.online_path(unit)) {
            Ok(state) => state.trim() == "1",
            Err(e) if e.kind() == ErrorKind::NotFound => cpu_dir(&self.root, unit).is_dir(),
            Err(e) => {
                warn!(unit, error = %e, "cannot read cpu online state");
                false
            }
        }
    }

    fn write_online(&self, unit: UnitId, online: bool) -> Result<(), ControllerError> {
        if !self.is_present(unit) {
            return Err(ControllerError::Pool(format!("cpu{unit} is not present")));
        }
        if self.is_online(unit) == online {
            return Ok(());
        }
        fs::write(self.online_path(unit), if online { "1" } else { "0" }).map_err(|e| {
            let verb = if online { "online" } else { "offline" };
            ControllerError::Pool(format!("cannot {verb} cpu{unit}: {e}"))
        })
    }
}

impl CpuPool for SysfsCpuPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn units(&self) -> Vec<UnitId> {
        self.present.clone()
    }

    fn active_units(&self) -> Vec<UnitId> {
        self.present.iter().copied().filter(|&unit| self.is_online(unit)).collect()
    }

    fn activate(&self, unit: UnitId) -> Result<(), ControllerError> {
        self.write_online(unit, true)
    }

    fn deactivate(&self, unit: UnitId) -> Result<(), ControllerError> {
        if unit == PRIMARY_UNIT {
            return Err(ControllerError::Pool("cpu0 cannot be taken offline".into()));
        }
        self.write_online(unit, false)
    }
}

/// Frequency probe reading `cpufreq/scaling_cur_freq` and
/// `cpufreq/scaling_max_freq` (kHz).
#[derive(Debug, Clone)]
pub struct SysfsFrequencyProbe {
    root: PathBuf,
}

impl SysfsFrequencyProbe {
    /// Probe rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_khz(&self, unit: UnitId, file: &str) -> Result<u64, ControllerError> {
        let path = cpu_dir(&self.root, unit).join("cpufreq").join(file);
        let raw = fs::read_to_string(&path)
            .map_err(|e| ControllerError::Probe(format!("{}: {e}", path.display())))?;
        raw.trim()
            .parse()
            .map_err(|e| ControllerError::Probe(format!("{}: {e}", path.display())))
    }
}

impl FrequencyProbe for SysfsFrequencyProbe {
    fn frequency(&self, unit: UnitId) -> Result<u64, ControllerError> {
        self.read_khz(unit, "scaling_cur_freq")
    }

    fn max_frequency(&self, unit: UnitId) -> Result<u64, ControllerError> {
        self.read_khz(unit, "scaling_max_freq")
    }
}
