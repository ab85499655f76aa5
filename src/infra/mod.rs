//! Adapters for the pool, probe and activity-notifier traits.

pub mod memory;
pub mod notifier;
pub mod sysfs;

pub use memory::SimulatedPool;
pub use notifier::ChannelNotifier;
pub use sysfs::{SysfsCpuPool, SysfsFrequencyProbe, SYSFS_CPU_ROOT};
