//! AirPi: a Raspberry Pi environmental sensor station
//!
//! This library provides the station runtime:
//! - Configuration files and station settings
//! - Resolution of configured sections into sensor, output and
//!   notification plugins
//! - The sample loop with its alerts and status LEDs

pub mod config;
pub mod core;
pub mod error;

use airpi_core::PluginCatalog;

// Re-export commonly used types
pub use config::{ConfigPaths, Settings};
pub use self::core::{Scheduler, Station};
pub use error::StartupError;

/// Catalog holding every built-in plugin
pub fn build_catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    airpi_sensors::register_all(&mut catalog);
    airpi_outputs::register_all(&mut catalog);
    airpi_notifications::register_all(&mut catalog);
    catalog
}
