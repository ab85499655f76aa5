//! Log subscriber setup.
//!
//! The controller only emits `tracing` events. Binaries that want them on
//! stderr call [`init_tracing`]; embedders install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Filter used when neither [`LOG_ENV_VAR`] nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "corescale=info";

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "CORESCALE_LOG";

/// Build a filter from `directives`, falling back to [`DEFAULT_LOG_FILTER`]
/// when they are absent or do not parse.
#[must_use]
pub fn log_filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Filter from `CORESCALE_LOG`, then `RUST_LOG`, then the default.
#[must_use]
pub fn log_filter() -> EnvFilter {
    let directives = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .ok();
    log_filter_from(directives.as_deref())
}

/// Install a stderr subscriber with [`log_filter`]. Controller threads are
/// named, so thread names are included. Returns `false` when a global
/// subscriber was already set.
pub fn init_tracing() -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
