//! airpi-sensors: Sensor plugins and the shared ADC support plugin.

pub mod adc;
pub mod analogue;
pub mod gps;
pub mod pulse;
pub mod simulated;
pub mod system_temp;

use airpi_core::{PluginCatalog, PluginRole};

/// Register every sensor plugin, plus the ADC support plugin that the
/// analogue sensors depend on
pub fn register_all(catalog: &mut PluginCatalog) {
    catalog.register_sensor(&simulated::DESCRIPTOR, simulated::create);
    catalog.register_sensor(&system_temp::DESCRIPTOR, system_temp::create);
    catalog.register_sensor(&adc::DESCRIPTOR, adc::create);
    catalog.register_sensor(&analogue::DESCRIPTOR, analogue::create);
    catalog.register_sensor(&pulse::RAINGAUGE, pulse::create_raingauge);
    catalog.register_sensor(&pulse::ANEMOMETER, pulse::create_anemometer);
    catalog.register_sensor(&gps::DESCRIPTOR, gps::create);

    log::debug!(
        "Registered {} sensor plugins",
        catalog.list(PluginRole::Sensor).len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut catalog = PluginCatalog::new();
        register_all(&mut catalog);

        assert_eq!(catalog.list(PluginRole::Sensor).len(), 7);
        assert!(catalog.lookup(PluginRole::Sensor, "analogue").is_ok());
        assert!(catalog.lookup(PluginRole::Sensor, "GPSD").unwrap().descriptor.reports_location);
        assert!(catalog.lookup(PluginRole::Output, "analogue").is_err());
    }
}
