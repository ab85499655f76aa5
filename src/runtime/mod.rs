//! Runtime pieces: the periodic task, the status surface and the tokio bridge.

pub mod api;
pub mod periodic;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_bridge;

pub use api::{list_params, status, update_param, ControllerStatus, ParamEntry};
pub use periodic::PeriodicTask;
#[cfg(feature = "tokio-runtime")]
pub use tokio_bridge::TokioActivityBridge;
