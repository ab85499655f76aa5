//! Error types for controller operations.

use thiserror::Error;

/// Errors produced by controller components.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A parameter write was out of bounds, unparsable, or redundant.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The parameter surface has no entry with this name.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    /// A configuration document failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The scheduler or the activity source could not be acquired.
    #[error("startup failed: {0}")]
    Startup(String),
    /// Bringing a unit online or offline failed.
    #[error("pool operation failed: {0}")]
    Pool(String),
    /// Reading a unit frequency failed.
    #[error("frequency query failed: {0}")]
    Probe(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
