//! Single-sensor, single-cycle reading records

use serde::{Deserialize, Serialize};

/// Name carried by every location reading
pub const LOCATION_NAME: &str = "Location";

/// How a value reading was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReadingType {
    /// Instantaneous measurement
    #[serde(rename = "sample")]
    #[default]
    Sample,
    /// Number of pulses counted since the previous reading
    #[serde(rename = "pulseCount")]
    PulseCount,
}

impl ReadingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::Sample => "sample",
            ReadingType::PulseCount => "pulseCount",
        }
    }
}

/// Whether the station is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "fixed")]
    Fixed,
}

/// Whether the station is outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exposure {
    #[serde(rename = "outdoor")]
    Outdoor,
    #[serde(rename = "indoor")]
    Indoor,
}

/// A position fix as reported by a location sensor
///
/// `altitude` is NaN until the receiver has a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub disposition: Disposition,
    pub exposure: Exposure,
}

impl Fix {
    /// A fix with no position yet
    pub fn none() -> Self {
        Self {
            latitude: f64::NAN,
            longitude: f64::NAN,
            altitude: f64::NAN,
            disposition: Disposition::Fixed,
            exposure: Exposure::Indoor,
        }
    }

    pub fn has_position(&self) -> bool {
        !self.altitude.is_nan()
    }
}

/// Reading from a standard (scalar) sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueReading {
    /// Measurement name, e.g. "Temperature"
    pub name: String,
    /// Sensor that produced the value, e.g. "DHT22"
    pub sensor: String,
    /// `None` when the sensor could not produce a value this cycle
    pub value: Option<f64>,
    pub unit: String,
    pub symbol: String,
    pub description: String,
    #[serde(rename = "readingType")]
    pub reading_type: ReadingType,
}

/// Reading from the location sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub name: String,
    pub sensor: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub disposition: Disposition,
    pub exposure: Exposure,
}

impl LocationReading {
    pub fn from_fix(sensor: impl Into<String>, fix: &Fix) -> Self {
        Self {
            name: LOCATION_NAME.to_string(),
            sensor: sensor.into(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            disposition: fix.disposition,
            exposure: fix.exposure,
        }
    }
}

/// One sensor's output for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Location(LocationReading),
    Value(ValueReading),
}

impl Reading {
    pub fn name(&self) -> &str {
        match self {
            Reading::Value(r) => &r.name,
            Reading::Location(r) => &r.name,
        }
    }

    pub fn sensor(&self) -> &str {
        match self {
            Reading::Value(r) => &r.sensor,
            Reading::Location(r) => &r.sensor,
        }
    }

    /// Scalar value, `None` for location readings and failed reads
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(r) => r.value,
            Reading::Location(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueReading> {
        match self {
            Reading::Value(r) => Some(r),
            Reading::Location(_) => None,
        }
    }
}

/// Crude health check applied to every scalar reading.
///
/// Zero is indistinguishable from a failed read for the sensors this
/// station drives, so it counts as unhealthy along with None and NaN.
pub fn is_healthy_value(value: Option<f64>) -> bool {
    matches!(value, Some(v) if !v.is_nan() && v != 0.0)
}
