//! Generic analogue sensor on the shared MCP3008
//!
//! The reading is reported in Ohms when the sensor sits in a voltage
//! divider with a known pull-up or pull-down resistor, otherwise in
//! millivolts. Requires the `mcp3008` support plugin to be loaded first.

use airpi_core::{
    AdcBus, PluginContext, PluginDescriptor, PluginInstance, PluginParams, Sample, Sensor,
    SensorInfo,
};
use anyhow::{bail, Result};
use std::sync::Arc;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("analogue", "Analogue")
    .description("Analogue sensor read through the MCP3008 ADC")
    .required(&["adcpin", "measurement", "sensorname"])
    .optional(&[
        "pullupresistance",
        "pulldownresistance",
        "sensorvoltage",
        "description",
    ]);

/// ADC reference voltage
const ADC_REFERENCE_VOLTS: f64 = 3.3;

/// Resistance of the wind vane at each heading, in Ohms
const WIND_DIRECTIONS: [(f64, f64); 16] = [
    (9_700.0, 22.5),
    (12_450.0, 45.0),
    (1_185.0, 67.5),
    (1_390.0, 90.0),
    (980.0, 112.5),
    (3_200.0, 135.0),
    (1_990.0, 157.5),
    (5_680.0, 180.0),
    (4_600.0, 202.5),
    (25_000.0, 225.0),
    (21_800.0, 247.5),
    (385_000.0, 270.0),
    (76_000.0, 292.5),
    (133_000.0, 315.0),
    (35_000.0, 337.5),
    (56_500.0, 360.0),
];

/// Heading whose vane resistance is closest to `ohms`
pub fn wind_direction(ohms: f64) -> f64 {
    WIND_DIRECTIONS
        .iter()
        .min_by(|a, b| (a.0 - ohms).abs().total_cmp(&(b.0 - ohms).abs()))
        .map(|(_, heading)| *heading)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Divider {
    None,
    PullUp(f64),
    PullDown(f64),
}

pub struct AnalogueSensor {
    info: SensorInfo,
    adc: Arc<dyn AdcBus>,
    channel: u8,
    divider: Divider,
    sensor_voltage: f64,
}

impl AnalogueSensor {
    /// Convert a raw count to the reported value; `None` when the wiring
    /// looks broken (no voltage or full voltage on the input).
    fn convert(&self, raw: u16) -> Option<f64> {
        let full_scale = self.adc.full_scale();
        let mut raw = raw;

        if raw == 0 {
            log::warn!(
                "Check wiring for the {} measurement, no voltage detected on ADC input {}",
                self.info.sensor_name,
                self.channel
            );
            return None;
        }
        if raw >= full_scale {
            if self.info.sensor_name == "LDR" {
                // full scale would divide by zero below
                raw = full_scale - 1;
            } else {
                log::warn!(
                    "Check wiring for the {} measurement, full voltage detected on ADC input {}",
                    self.info.sensor_name,
                    self.channel
                );
                return None;
            }
        }

        let vout = raw as f64 / full_scale as f64 * ADC_REFERENCE_VOLTS;
        let value = match self.divider {
            Divider::PullUp(r) => r / ((self.sensor_voltage / vout) - 1.0),
            Divider::PullDown(r) => (r * self.sensor_voltage) / vout - r,
            Divider::None => vout * 1000.0,
        };

        if self.info.sensor_name == "WindDirection" {
            return Some(wind_direction(value));
        }
        Some(value)
    }
}

impl Sensor for AnalogueSensor {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn sample(&mut self) -> Result<Sample> {
        let raw = self.adc.read_channel(self.channel)?;
        Ok(Sample::Value(self.convert(raw)))
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let adc = context.require_adc(params.plugin_name())?;
    let channel: u8 = params.parse_required("adcpin")?;
    if channel >= adc.channels() {
        let text = params.require("adcpin")?;
        return Err(params
            .invalid("adcpin", text, format!("ADC has {} channels", adc.channels()))
            .into());
    }
    let measurement = params.require("measurement")?;
    let sensor_name = params.require("sensorname")?;

    let divider = match (
        params.parse::<f64>("pullupresistance")?,
        params.parse::<f64>("pulldownresistance")?,
    ) {
        (Some(_), Some(_)) => bail!(
            "Choose either a pull up or a pull down resistor for the {} measurement, not both",
            measurement
        ),
        (Some(r), None) => Divider::PullUp(r),
        (None, Some(r)) => Divider::PullDown(r),
        (None, None) => Divider::None,
    };
    if sensor_name == "WindDirection" && !matches!(divider, Divider::PullUp(_)) {
        bail!("WindDirection needs a pullupResistance to convert the vane reading");
    }

    let (unit, symbol) = match (sensor_name, divider) {
        ("WindDirection", _) => ("Degrees", "deg"),
        (_, Divider::None) => ("millivolts", "mV"),
        _ => ("Ohms", "Ohms"),
    };

    let info = SensorInfo::new(sensor_name, measurement)
        .with_unit(unit, symbol)
        .with_description(params.get("description").unwrap_or("An analogue sensor."));

    Ok(PluginInstance::Sensor(Box::new(AnalogueSensor {
        info,
        adc,
        channel,
        divider,
        sensor_voltage: params.parse_or("sensorvoltage", ADC_REFERENCE_VOLTS)?,
    })))
}
