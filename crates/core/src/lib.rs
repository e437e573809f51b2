//! airpi-core: Plugin contracts, catalog and shared services for AirPi.
//!
//! This crate contains the capability traits (Sensor, Output,
//! Notification), plugin descriptors and parameters, the plugin catalog,
//! the services shared between plugins, and shared constants.

pub mod adc;
pub mod calibration;
pub mod constants;
mod context;
mod descriptor;
mod error;
pub mod gpio;
mod params;
mod plugin;
pub mod pulse;
mod registry;
mod role;
pub mod template;

pub use adc::AdcBus;
pub use calibration::{Calibration, CalibrationRule};
pub use constants::{
    COMMON_SECTION, CONNECTIVITY_PROBE_URL, CONNECTIVITY_TIMEOUT, DEFAULT_SAMPLE_INTERVAL,
    INDICATOR_PULSE, PULSE_DEBOUNCE, PULSE_FLOOR, SLEEP_GUARD_BAND,
};
pub use context::PluginContext;
pub use descriptor::PluginDescriptor;
pub use error::PluginError;
pub use params::{parse_flag, PluginParams};
pub use plugin::{
    Notification, NotificationEvent, Output, PluginInstance, Sample, Sensor, SensorInfo,
};
pub use pulse::PulseCounter;
pub use registry::{PluginCatalog, PluginEntry, PluginFactory};
pub use role::PluginRole;

// Re-export types used in trait signatures for convenience
pub use airpi_types::{Fix, Frame, Reading, ReadingType, RunMetadata};
