//! Station runtime: plugin resolution, the sample loop and the services
//! around it

pub mod connectivity;
pub mod console;
pub mod indicator;
mod interrupt;
pub mod metadata;
mod plugin_set;
mod resolver;
pub mod scheduler;
mod station;

pub use connectivity::{ConnectivityGate, HttpProbe};
pub use indicator::{Indicators, LedMode, StatusLight};
pub use interrupt::Interrupt;
pub use plugin_set::{LoadedPlugin, PluginSet};
pub use resolver::{Resolved, Resolver};
pub use scheduler::{CycleOutcome, Scheduler, SensorFailurePolicy};
pub use station::{delay_to_next_minute, Station};
