//! dweet.io telemetry output

use crate::calibration;
use airpi_core::{Calibration, Frame, Output, PluginContext, PluginDescriptor, PluginInstance, PluginParams, Reading};
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("dweet", "dweet.io")
    .description("Post readings to a dweet.io thing")
    .required(&["thing"])
    .optional(&["server", "calibration"])
    .needs_internet();

const DEFAULT_SERVER: &str = "https://dweet.io:443";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body: measurement name to value, locations as an object
fn payload(frame: &Frame) -> Value {
    let mut body = Map::new();
    for reading in frame {
        let value = match reading {
            Reading::Value(r) => r.value.map(Value::from).unwrap_or(Value::Null),
            Reading::Location(l) => serde_json::json!({
                "lat": l.latitude,
                "lon": l.longitude,
                "alt": l.altitude,
            }),
        };
        body.insert(reading.name().to_string(), value);
    }
    Value::Object(body)
}

pub struct DweetOutput {
    url: String,
    agent: ureq::Agent,
    calibration: Option<Arc<Calibration>>,
}

impl Output for DweetOutput {
    fn output_data(&mut self, frame: &Frame) -> Result<bool> {
        let body = match &self.calibration {
            Some(cal) => payload(&cal.calibrate(frame)),
            None => payload(frame),
        };
        match self.agent.post(&self.url).send_json(body) {
            Ok(response) if response.status() == 200 => {
                log::debug!("Successfully dweeted");
                Ok(true)
            }
            Ok(response) => {
                log::warn!("Did not dweet successfully: HTTP {}", response.status());
                Ok(false)
            }
            Err(ureq::Error::Status(code, _)) => {
                log::warn!("Did not dweet successfully: HTTP {}", code);
                Ok(false)
            }
            Err(e) => {
                log::warn!("Did not dweet successfully: {}", e);
                Ok(false)
            }
        }
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let thing = params.require("thing")?;
    let server = params.get("server").unwrap_or(DEFAULT_SERVER).trim_end_matches('/');
    let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();

    Ok(PluginInstance::Output(Box::new(DweetOutput {
        url: format!("{}/dweet/for/{}", server, thing),
        agent,
        calibration: calibration::requested(params, context),
    })))
}
