//! Configuration: live tunables, the parameter table and the controller
//! configuration document.

pub mod tunables;
pub mod params;
pub mod controller;

pub use tunables::{Tunables, TunablesSnapshot};
pub use params::{find_param, parse_value, ParamSpec, ENABLED_PARAM, PARAMS};
pub use controller::{ControllerConfig, ENV_PREFIX};
