//! Station settings from the `Main` section of `settings.json`

use crate::config::source::{ConfigSource, Section};
use crate::core::indicator::LedMode;
use crate::core::scheduler::SensorFailurePolicy;
use crate::error::StartupError;
use airpi_core::{parse_flag, DEFAULT_SAMPLE_INTERVAL};
use std::path::Path;
use std::time::Duration;

const MAIN_SECTION: &str = "Main";

/// Immutable station settings, built once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time between the starts of two cycles (`sampleFreq`, seconds)
    pub sample_interval: Duration,
    pub operator: String,
    /// Fail LED pin (BCM), 0 when not fitted
    pub red_pin: u32,
    /// Success LED pin (BCM), 0 when not fitted
    pub green_pin: u32,
    /// Print per-cycle failures to the console as well as the log
    pub print_errors: bool,
    pub success_led: LedMode,
    pub fail_led: LedMode,
    pub sensor_failure: SensorFailurePolicy,
    /// Start sampling on the next full minute
    pub align_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            operator: "unknown".to_string(),
            red_pin: 0,
            green_pin: 0,
            print_errors: false,
            success_led: LedMode::All,
            fail_led: LedMode::Constant,
            sensor_failure: SensorFailurePolicy::Abort,
            align_start: true,
        }
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> StartupError {
    StartupError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn pin(main: &Section, key: &str) -> Result<u32, StartupError> {
    match main.get(key) {
        None => Ok(0),
        Some(text) => text
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(key, text, "expected a GPIO pin number, 0 to disable")),
    }
}

fn flag(main: &Section, key: &str, default: bool) -> Result<bool, StartupError> {
    match main.get(key) {
        None => Ok(default),
        Some(text) => parse_flag(text).ok_or_else(|| invalid(key, text, "expected on/off, yes/no, true/false or 1/0")),
    }
}

impl Settings {
    /// Load from `settings.json`
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        Self::from_source(&ConfigSource::load(path)?)
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self, StartupError> {
        let main = source.section(MAIN_SECTION).ok_or_else(|| StartupError::MalformedConfig {
            path: source.path().to_path_buf(),
            reason: format!("no '{}' section", MAIN_SECTION),
        })?;
        let defaults = Self::default();

        let sample_interval = match main.get("sampleFreq") {
            None => defaults.sample_interval,
            Some(text) => {
                let seconds: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| invalid("sampleFreq", text, "expected a number of seconds"))?;
                if !(seconds.is_finite() && seconds > 0.0) {
                    return Err(invalid("sampleFreq", text, "must be greater than zero"));
                }
                Duration::try_from_secs_f64(seconds)
                    .map_err(|_| invalid("sampleFreq", text, "out of range"))?
            }
        };

        let sensor_failure = match main.get("sensorFailure") {
            None => defaults.sensor_failure,
            Some(text) => text
                .parse()
                .map_err(|_| invalid("sensorFailure", text, "expected abort or degrade"))?,
        };

        Ok(Self {
            sample_interval,
            operator: main.get("operator").unwrap_or(defaults.operator.as_str()).to_string(),
            red_pin: pin(main, "redPin")?,
            green_pin: pin(main, "greenPin")?,
            print_errors: flag(main, "printErrors", defaults.print_errors)?,
            success_led: main.get("successLED").map(LedMode::from_setting).unwrap_or(defaults.success_led),
            fail_led: main.get("failLED").map(LedMode::from_setting).unwrap_or(defaults.fail_led),
            sensor_failure,
            align_start: flag(main, "alignStart", defaults.align_start)?,
        })
    }
}
