//! Alert message text shared by the notification plugins
//!
//! The text comes from the `msgalertsensor` and `msgalertoutput` keys of
//! the `Common` section and may use the `<hostname>` and `<event>`
//! placeholders.

use airpi_core::template;
use airpi_core::{NotificationEvent, PluginContext, PluginParams};
use std::collections::HashMap;

/// Parameters every notification plugin takes from the `Common` section
pub const COMMON_PARAMS: &[&str] = &["msgalertsensor", "msgalertoutput"];

const DEFAULT_SENSOR_ALERT: &str = "AirPi <hostname>: a sensor returned an invalid reading";
const DEFAULT_OUTPUT_ALERT: &str = "AirPi <hostname>: an output failed to record data";

#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessages {
    hostname: String,
    sensor: String,
    output: String,
}

impl AlertMessages {
    pub fn from_params(params: &PluginParams, context: &PluginContext) -> Self {
        Self {
            hostname: context.metadata().pi_name.clone(),
            sensor: params.get("msgalertsensor").unwrap_or(DEFAULT_SENSOR_ALERT).to_string(),
            output: params.get("msgalertoutput").unwrap_or(DEFAULT_OUTPUT_ALERT).to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Expanded message for `event`
    pub fn text(&self, event: NotificationEvent) -> String {
        let template_text = match event {
            NotificationEvent::AlertSensor => &self.sensor,
            NotificationEvent::AlertOutput => &self.output,
        };
        let mut values = HashMap::new();
        values.insert("hostname", self.hostname.clone());
        values.insert("event", event.tag().to_string());
        template::expand(template_text, &values)
    }
}
