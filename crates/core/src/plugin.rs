//! Plugin capability traits and related types

use airpi_types::{Fix, Frame, ReadingType, RunMetadata};
use anyhow::Result;
use std::any::Any;
use std::fmt;

/// Static description of what a sensor measures
#[derive(Debug, Clone, PartialEq)]
pub struct SensorInfo {
    /// Hardware or driver name, e.g. "DHT22"
    pub sensor_name: String,
    /// Measurement name, e.g. "Temperature"
    pub value_name: String,
    pub unit: String,
    pub symbol: String,
    pub description: String,
    pub reading_type: ReadingType,
}

impl SensorInfo {
    pub fn new(sensor_name: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            sensor_name: sensor_name.into(),
            value_name: value_name.into(),
            unit: String::new(),
            symbol: String::new(),
            description: String::new(),
            reading_type: ReadingType::Sample,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.unit = unit.into();
        self.symbol = symbol.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reading_type(mut self, reading_type: ReadingType) -> Self {
        self.reading_type = reading_type;
        self
    }
}

/// What a single sensor read produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Scalar value; `None` when the hardware gave nothing usable
    Value(Option<f64>),
    /// Position fix from a location sensor
    Location(Fix),
}

/// Trait for all sensors
///
/// Sensors are read once per cycle by the sample loop, in registration
/// order. A read blocks the loop until it returns.
pub trait Sensor: Send {
    /// Describe the measurement this sensor produces
    fn info(&self) -> &SensorInfo;

    /// Take one reading
    fn sample(&mut self) -> Result<Sample>;

    /// Stop any background work (reader threads, edge watchers).
    /// Called once when sampling stops.
    fn stop(&mut self) {}
}

/// Trait for all outputs
///
/// Outputs receive every frame in registration order and report whether
/// they handled it.
pub trait Output: Send {
    /// Deliver one frame. `Ok(false)` is a recoverable failure; `Err`
    /// aborts the remaining dispatch for this cycle.
    fn output_data(&mut self, frame: &Frame) -> Result<bool>;

    /// Render the run metadata, if this output supports it.
    ///
    /// Returning `Some` makes the text part of the startup banner.
    fn output_metadata(&mut self, _metadata: &RunMetadata) -> Option<String> {
        None
    }
}

/// Events the sample loop can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationEvent {
    /// At least one sensor produced an invalid reading
    AlertSensor,
    /// At least one output failed to handle the frame
    AlertOutput,
}

impl NotificationEvent {
    /// Tag used in configuration (`msg<tag>`) and logs
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationEvent::AlertSensor => "alertsensor",
            NotificationEvent::AlertOutput => "alertoutput",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Trait for all notifiers
pub trait Notification: Send {
    /// Send an alert. Failures are logged by the caller and never retried.
    fn send_notification(&mut self, event: NotificationEvent) -> Result<()>;
}

/// A constructed plugin, tagged with the capability it offers
pub enum PluginInstance {
    Sensor(Box<dyn Sensor>),
    Output(Box<dyn Output>),
    Notification(Box<dyn Notification>),
    /// Constructed for its side effects only; kept alive but never dispatched
    Support(Box<dyn Any + Send>),
}

impl PluginInstance {
    /// Capability name used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            PluginInstance::Sensor(_) => "sensor",
            PluginInstance::Output(_) => "output",
            PluginInstance::Notification(_) => "notification",
            PluginInstance::Support(_) => "support",
        }
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginInstance::{}", self.kind())
    }
}
