//! Shared calibration of readings
//!
//! A calibration maps the raw value of a named measurement through a
//! polynomial and replaces its symbol. Outputs that ask for calibrated data
//! share one `Calibration`, which caches the last frame it worked on so the
//! second and later outputs in a cycle get the cached copy.

use airpi_types::{Frame, Reading};
use std::sync::Mutex;

/// Calibration for a single measurement name
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRule {
    pub name: String,
    /// Polynomial coefficients, lowest order first
    pub coefficients: Vec<f64>,
    /// Symbol to report for the calibrated value
    pub symbol: String,
}

impl CalibrationRule {
    /// Parse a rule of the form `"c0 c1 c2 ...,symbol"`.
    ///
    /// `"0 2.5,lux"` maps `x` to `2.5 * x`.
    pub fn parse(name: &str, text: &str) -> Result<Self, String> {
        let (terms, symbol) = text
            .rsplit_once(',')
            .ok_or_else(|| "expected '<coefficients>,<symbol>'".to_string())?;

        let coefficients = terms
            .split_whitespace()
            .map(|t| t.parse::<f64>().map_err(|e| format!("bad coefficient '{}': {}", t, e)))
            .collect::<Result<Vec<_>, _>>()?;

        if coefficients.is_empty() {
            return Err("no coefficients given".to_string());
        }

        Ok(Self {
            name: name.to_string(),
            coefficients,
            symbol: symbol.trim().to_string(),
        })
    }

    /// Evaluate the polynomial at `x`
    pub fn apply(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }
}

/// Cached input/output pair of the last calibration
struct LastRun {
    input: Frame,
    output: Frame,
}

/// Calibration shared by every output that asks for calibrated data
pub struct Calibration {
    rules: Vec<CalibrationRule>,
    last: Mutex<Option<LastRun>>,
}

impl Calibration {
    pub fn new(rules: Vec<CalibrationRule>) -> Self {
        Self {
            rules,
            last: Mutex::new(None),
        }
    }

    pub fn rules(&self) -> &[CalibrationRule] {
        &self.rules
    }

    /// Return a calibrated copy of `frame`; the input is left untouched.
    ///
    /// Calibrating the same frame again returns the cached result.
    pub fn calibrate(&self, frame: &Frame) -> Frame {
        // Recover from a poisoned mutex - the cache is only an optimisation
        let mut last = self.last.lock().unwrap_or_else(|poisoned| {
            log::warn!("Calibration cache mutex was poisoned, recovering");
            poisoned.into_inner()
        });

        if let Some(run) = last.as_ref() {
            if run.input == *frame {
                return run.output.clone();
            }
        }

        let mut output = frame.clone();
        for reading in output.readings.iter_mut() {
            let Reading::Value(value_reading) = reading else {
                continue;
            };
            for rule in self.rules.iter().filter(|r| r.name == value_reading.name) {
                if let Some(raw) = value_reading.value {
                    value_reading.value = Some(rule.apply(raw));
                    value_reading.symbol = rule.symbol.clone();
                }
            }
        }

        *last = Some(LastRun {
            input: frame.clone(),
            output: output.clone(),
        });
        output
    }
}

impl std::fmt::Debug for Calibration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calibration").field("rules", &self.rules).finish()
    }
}
