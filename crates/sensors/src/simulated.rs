//! Simulated sensor for bench testing and demonstration
//!
//! Provides a configurable value with a fixed setting, a periodic wave, or
//! uniform noise, so a station can be exercised without hardware.

use airpi_core::{PluginContext, PluginDescriptor, PluginInstance, PluginParams, Sample, Sensor, SensorInfo};
use anyhow::Result;
use rand::Rng;
use std::str::FromStr;
use std::time::Instant;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("test", "Simulated")
    .description("Simulated sensor producing fixed, wave or random values")
    .optional(&[
        "mode",
        "value",
        "min",
        "max",
        "period",
        "measurement",
        "unit",
        "symbol",
        "description",
    ]);

/// Value generation mode
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TestMode {
    /// Static value
    #[default]
    Manual,
    /// Sine wave oscillation
    SineWave,
    /// Sawtooth wave (linear ramp)
    Sawtooth,
    /// Triangle wave
    Triangle,
    /// Square wave
    Square,
    /// Uniform noise between min and max
    Random,
}

impl FromStr for TestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "fixed" => Ok(TestMode::Manual),
            "sine" | "sine_wave" => Ok(TestMode::SineWave),
            "sawtooth" => Ok(TestMode::Sawtooth),
            "triangle" => Ok(TestMode::Triangle),
            "square" => Ok(TestMode::Square),
            "random" => Ok(TestMode::Random),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Configuration for the simulated sensor
#[derive(Debug, Clone)]
pub struct TestSensorConfig {
    pub mode: TestMode,
    /// Value used in Manual mode
    pub manual_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Wave period in seconds (for oscillation modes)
    pub period: f64,
}

impl Default for TestSensorConfig {
    fn default() -> Self {
        Self {
            mode: TestMode::Manual,
            manual_value: 50.0,
            min_value: 0.0,
            max_value: 100.0,
            period: 60.0,
        }
    }
}

/// Simulated sensor
pub struct TestSensor {
    info: SensorInfo,
    config: TestSensorConfig,
    start_time: Instant,
}

impl TestSensor {
    pub fn new(info: SensorInfo, config: TestSensorConfig) -> Self {
        Self {
            info,
            config,
            start_time: Instant::now(),
        }
    }

    /// Calculate value based on current mode and elapsed seconds
    fn calculate_value(config: &TestSensorConfig, elapsed: f64) -> f64 {
        let range = config.max_value - config.min_value;
        let period = if config.period > 0.0 { config.period } else { 1.0 };

        match config.mode {
            TestMode::Manual => config.manual_value,
            TestMode::SineWave => {
                let phase = (elapsed / period) * std::f64::consts::TAU;
                let normalized = (phase.sin() + 1.0) / 2.0; // 0.0 to 1.0
                config.min_value + normalized * range
            }
            TestMode::Sawtooth => {
                let normalized = (elapsed / period).fract(); // 0.0 to 1.0
                config.min_value + normalized * range
            }
            TestMode::Triangle => {
                let phase = (elapsed / period).fract() * 2.0; // 0.0 to 2.0
                let normalized = if phase <= 1.0 { phase } else { 2.0 - phase };
                config.min_value + normalized * range
            }
            TestMode::Square => {
                let phase = (elapsed / period).fract();
                if phase < 0.5 {
                    config.min_value
                } else {
                    config.max_value
                }
            }
            TestMode::Random => {
                if range > 0.0 {
                    rand::thread_rng().gen_range(config.min_value..config.max_value)
                } else {
                    config.min_value
                }
            }
        }
    }
}

impl Sensor for TestSensor {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn sample(&mut self) -> Result<Sample> {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        Ok(Sample::Value(Some(Self::calculate_value(&self.config, elapsed))))
    }
}

pub fn create(params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
    let defaults = TestSensorConfig::default();
    let mode = match params.get("mode") {
        Some(text) => text
            .parse::<TestMode>()
            .map_err(|e| params.invalid("mode", text, e))?,
        None => defaults.mode,
    };
    let config = TestSensorConfig {
        mode,
        manual_value: params.parse_or("value", defaults.manual_value)?,
        min_value: params.parse_or("min", defaults.min_value)?,
        max_value: params.parse_or("max", defaults.max_value)?,
        period: params.parse_or("period", defaults.period)?,
    };

    let info = SensorInfo::new("Simulated", params.get("measurement").unwrap_or("Test_Value"))
        .with_unit(params.get("unit").unwrap_or(""), params.get("symbol").unwrap_or(""))
        .with_description(params.get("description").unwrap_or("A simulated sensor."));

    Ok(PluginInstance::Sensor(Box::new(TestSensor::new(info, config))))
}
