//! Builders to construct controllers from configuration.

pub mod controller_builder;

pub use controller_builder::{build_controller, build_sysfs_controller, SysfsController};
