//! airpi-types: Shared data types for the AirPi sensor station.
//!
//! This crate contains pure data types (readings, frames, run metadata)
//! that are shared across all AirPi crates. These types have no hardware
//! or plugin dependencies, making them suitable as a foundation layer.

pub mod frame;
pub mod metadata;
pub mod reading;

// Re-export commonly used types at the crate root for convenience
pub use frame::Frame;
pub use metadata::RunMetadata;
pub use reading::{
    is_healthy_value, Disposition, Exposure, Fix, LocationReading, Reading, ReadingType,
    ValueReading, LOCATION_NAME,
};
