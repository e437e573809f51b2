//! SoC temperature sensor
//!
//! Reads the Raspberry Pi's own temperature through sysinfo's component
//! list. Handy as a sanity channel that needs no extra wiring.

use airpi_core::{PluginContext, PluginDescriptor, PluginInstance, PluginParams, Sample, Sensor, SensorInfo};
use anyhow::Result;
use std::time::{Duration, Instant};
use sysinfo::Components;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("cputemp", "SoC temperature")
    .description("Raspberry Pi SoC temperature via the kernel thermal zones")
    .optional(&["label", "unit", "description"]);

/// Minimum interval between component refreshes (250ms)
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Temperature unit for reporting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Pick the component to report: the one whose label contains `wanted`,
/// else the first one that looks like a CPU, else the first one.
fn select_component(labels: &[String], wanted: Option<&str>) -> Option<usize> {
    if let Some(wanted) = wanted {
        let wanted = wanted.to_lowercase();
        return labels.iter().position(|l| l.to_lowercase().contains(&wanted));
    }
    labels
        .iter()
        .position(|l| {
            let l = l.to_lowercase();
            l.contains("cpu") || l.contains("soc") || l.contains("thermal")
        })
        .or(if labels.is_empty() { None } else { Some(0) })
}

/// SoC temperature sensor
pub struct SystemTempSensor {
    info: SensorInfo,
    components: Components,
    label: Option<String>,
    unit: TemperatureUnit,
    last_refresh: Instant,
}

impl SystemTempSensor {
    fn refresh_if_needed(&mut self) {
        if self.last_refresh.elapsed() >= MIN_REFRESH_INTERVAL {
            self.components.refresh();
            self.last_refresh = Instant::now();
        }
    }
}

impl Sensor for SystemTempSensor {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn sample(&mut self) -> Result<Sample> {
        self.refresh_if_needed();
        let labels: Vec<String> = self
            .components
            .iter()
            .map(|c| c.label().to_string())
            .collect();

        let celsius = select_component(&labels, self.label.as_deref())
            .and_then(|index| self.components.iter().nth(index))
            .map(|c| c.temperature() as f64)
            .filter(|t| t.is_finite());

        let value = match self.unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius.map(|c| c * 1.8 + 32.0),
        };
        if value.is_none() {
            log::debug!("No temperature component available");
        }
        Ok(Sample::Value(value))
    }
}

pub fn create(params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
    let unit = match params.get("unit") {
        None => TemperatureUnit::Celsius,
        Some(text) if text.eq_ignore_ascii_case("c") => TemperatureUnit::Celsius,
        Some(text) if text.eq_ignore_ascii_case("f") => TemperatureUnit::Fahrenheit,
        Some(text) => return Err(params.invalid("unit", text, "expected C or F").into()),
    };
    let (unit_name, symbol) = match unit {
        TemperatureUnit::Celsius => ("Celsius", "C"),
        TemperatureUnit::Fahrenheit => ("Fahrenheit", "F"),
    };

    let components = Components::new_with_refreshed_list();
    log::info!("SoC temperature sensor found {} components", components.len());

    let info = SensorInfo::new("SoC", "CPU_Temperature")
        .with_unit(unit_name, symbol)
        .with_description(params.get("description").unwrap_or("The Raspberry Pi's own temperature."));

    Ok(PluginInstance::Sensor(Box::new(SystemTempSensor {
        info,
        components,
        label: params.get("label").map(str::to_string),
        unit,
        last_refresh: Instant::now(),
    })))
}
