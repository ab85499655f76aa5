//! Controller configuration document.
//!
//! Tunables depend on the pool capacity, which is only known once the pool is
//! opened, so a document carries either a full [`TunablesSnapshot`] or
//! per-parameter overrides applied on top of the capacity defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::params::{find_param, parse_value, ENABLED_PARAM};
use crate::config::tunables::{Tunables, TunablesSnapshot};
use crate::core::controller::DEFAULT_INITIAL_DELAY;
use crate::core::AppResult;

/// Prefix of environment variables read by [`ControllerConfig::from_env`].
pub const ENV_PREFIX: &str = "CORESCALE_";

const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system/cpu";

/// Root controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Full tunables; capacity defaults when absent.
    pub tunables: Option<TunablesSnapshot>,
    /// Per-parameter overrides by name, applied after `tunables`.
    pub params: BTreeMap<String, String>,
    /// Grace delay before the first cycle after enabling.
    pub initial_delay_ms: u64,
    /// Start the controller as soon as it is built.
    pub enabled: bool,
    /// Root of the per-cpu sysfs tree.
    pub sysfs_root: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tunables: None,
            params: BTreeMap::new(),
            initial_delay_ms: u64::try_from(DEFAULT_INITIAL_DELAY.as_millis()).unwrap_or(u64::MAX),
            enabled: false,
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl ControllerConfig {
    /// Validate capacity-independent fields.
    ///
    /// # Errors
    ///
    /// Returns a message for an unknown parameter name or an unparsable value.
    pub fn validate(&self) -> Result<(), String> {
        if self.sysfs_root.as_os_str().is_empty() {
            return Err("sysfs_root must not be empty".into());
        }
        for (name, raw) in &self.params {
            if name == ENABLED_PARAM {
                return Err("`enabled` is a top-level field, not a parameter override".into());
            }
            if find_param(name).is_none() {
                return Err(format!("unknown parameter `{name}`"));
            }
            parse_value(name, raw).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Resolve live tunables for a pool of `capacity` units. Overrides are
    /// applied together and the result is validated as a whole, so dependent
    /// bounds such as `min_active_units <= max_active_units` do not depend on
    /// the order overrides are listed in.
    ///
    /// # Errors
    ///
    /// Returns a message when an override is unknown, unparsable, or out of
    /// bounds, or when the resolved set fails validation.
    pub fn tunables_for(&self, capacity: u32) -> Result<Tunables, String> {
        let mut snapshot = self
            .tunables
            .unwrap_or_else(|| TunablesSnapshot::defaults_for(capacity));
        let mut resolved = Vec::with_capacity(self.params.len());
        for (name, raw) in &self.params {
            let spec = find_param(name).ok_or_else(|| format!("unknown parameter `{name}`"))?;
            let value = parse_value(name, raw).map_err(|e| e.to_string())?;
            spec.apply(&mut snapshot, value);
            resolved.push((spec, value));
        }
        for (spec, value) in resolved {
            let (low, high) = spec.bounds(&snapshot, capacity);
            if value < low || value > high {
                return Err(format!("{} must be within {low}..={high}, got {value}", spec.name));
            }
        }
        Tunables::new(snapshot, capacity)
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse error message or the message from [`Self::validate`].
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env` first.
    ///
    /// Recognized variables: `CORESCALE_ENABLED`, `CORESCALE_INITIAL_DELAY_MS`,
    /// `CORESCALE_SYSFS_ROOT`, and `CORESCALE_<PARAM>` for every tunable
    /// parameter (for example `CORESCALE_MAX_ACTIVE_UNITS=4`).
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`Self::from_vars`].
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(key, value)` pairs using the environment
    /// naming scheme. Keys without the prefix are ignored.
    ///
    /// # Errors
    ///
    /// Fails when a recognized variable does not parse or the resulting
    /// configuration does not validate.
    pub fn from_vars<I>(vars: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cfg = Self::default();
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.trim();
            match name {
                "ENABLED" => {
                    cfg.enabled = parse_flag(value)
                        .with_context(|| format!("{key}: expected 0/1 or true/false"))?;
                }
                "INITIAL_DELAY_MS" => {
                    cfg.initial_delay_ms = value
                        .parse::<u64>()
                        .with_context(|| format!("{key}: expected milliseconds"))?;
                }
                "SYSFS_ROOT" => cfg.sysfs_root = PathBuf::from(value),
                other => {
                    let param = other.to_ascii_lowercase();
                    if find_param(&param).is_some() {
                        cfg.params.insert(param, value.to_string());
                    } else {
                        tracing::debug!(variable = %key, "ignoring unrecognized variable");
                    }
                }
            }
        }
        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("invalid environment configuration")?;
        Ok(cfg)
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid flag `{other}`"),
    }
}
