//! airpi-outputs: Output plugins and the calibration support plugin.

pub mod calibration;
pub mod csv;
pub mod dashboard;
pub mod dweet;
pub mod print;

use airpi_core::{PluginCatalog, PluginRole};

/// Register every output plugin, plus the calibration support plugin
/// that outputs share
pub fn register_all(catalog: &mut PluginCatalog) {
    catalog.register_output(&calibration::DESCRIPTOR, calibration::create);
    catalog.register_output(&print::DESCRIPTOR, print::create);
    catalog.register_output(&csv::DESCRIPTOR, csv::create);
    catalog.register_output(&dashboard::DESCRIPTOR, dashboard::create);
    catalog.register_output(&dweet::DESCRIPTOR, dweet::create);

    log::debug!(
        "Registered {} output plugins",
        catalog.list(PluginRole::Output).len()
    );
}
