//! GPS receiver via gpsd
//!
//! A reader thread keeps a watch open on gpsd's JSON socket and stores
//! the latest position; sampling just copies it. Until the receiver has a
//! fix the altitude stays NaN, which keeps the location out of outputs.

use airpi_core::{PluginContext, PluginDescriptor, PluginInstance, PluginParams, Sample, Sensor, SensorInfo};
use airpi_types::{Disposition, Exposure, Fix, LOCATION_NAME};
use anyhow::{Context, Result};
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("gpsd", "GPS")
    .description("Position from a GPS receiver through gpsd")
    .optional(&["host", "port", "sensorname"])
    .reports_location();

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 2947;
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";
/// Socket read timeout, bounds how long stop() waits
const READ_TIMEOUT: Duration = Duration::from_millis(500);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Above this speed (m/s) the station is taken to be moving outdoors
const MOBILE_SPEED: f64 = 1.0;

/// gpsd time-position-velocity report
#[derive(Debug, Deserialize)]
struct Tpv {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    #[serde(rename = "altHAE")]
    alt_hae: Option<f64>,
    speed: Option<f64>,
}

/// Parse one line of gpsd output; `None` for anything that is not a TPV
/// report. A TPV without a 2D fix gives `Fix::none()`.
fn parse_tpv(line: &str) -> Option<Fix> {
    let tpv: Tpv = serde_json::from_str(line).ok()?;
    if tpv.class != "TPV" {
        return None;
    }
    if tpv.mode < 2 {
        return Some(Fix::none());
    }
    let (latitude, longitude) = (tpv.lat?, tpv.lon?);
    let moving = tpv.speed.unwrap_or(0.0) > MOBILE_SPEED;
    Some(Fix {
        latitude,
        longitude,
        // a 2D fix has no altitude; report sea level rather than "no fix"
        altitude: tpv.alt_msl.or(tpv.alt).or(tpv.alt_hae).unwrap_or(0.0),
        disposition: if moving { Disposition::Mobile } else { Disposition::Fixed },
        exposure: if moving { Exposure::Outdoor } else { Exposure::Indoor },
    })
}

/// Read reports until asked to stop or the connection drops
fn watch(address: &str, latest: &Mutex<Fix>, stop_rx: &Receiver<()>) -> Result<bool> {
    let mut stream = TcpStream::connect(address)
        .with_context(|| format!("Failed to connect to gpsd at {}", address))?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.write_all(WATCH_COMMAND)?;
    log::info!("Watching gpsd at {}", address);

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        match stop_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => return Ok(true),
        }
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(false),
            Ok(_) => {
                if let Some(fix) = parse_tpv(line.trim()) {
                    *latest.lock().unwrap_or_else(|p| p.into_inner()) = fix;
                }
                line.clear();
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

pub struct GpsSensor {
    info: SensorInfo,
    latest: Arc<Mutex<Fix>>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Sensor for GpsSensor {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn sample(&mut self) -> Result<Sample> {
        let fix = *self.latest.lock().unwrap_or_else(|p| p.into_inner());
        Ok(Sample::Location(fix))
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("Stopping GPS controller");
            let _ = self.stop_tx.try_send(());
            if handle.join().is_err() {
                log::warn!("GPS reader thread panicked");
            }
        }
    }
}

impl Drop for GpsSensor {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn create(params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
    let host = params.get("host").unwrap_or(DEFAULT_HOST).to_string();
    let port: u16 = params.parse_or("port", DEFAULT_PORT)?;
    let address = format!("{}:{}", host, port);

    let latest = Arc::new(Mutex::new(Fix::none()));
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let shared = latest.clone();
    let handle = std::thread::Builder::new()
        .name("gpsd-reader".to_string())
        .spawn(move || loop {
            match watch(&address, &shared, &stop_rx) {
                Ok(true) => break,
                Ok(false) => log::warn!("gpsd closed the connection"),
                Err(e) => log::warn!("GPS: {:#}", e),
            }
            // waiting on the stop channel doubles as the reconnect delay
            match stop_rx.recv_timeout(RECONNECT_DELAY) {
                Err(crossbeam::channel::RecvTimeoutError::Timeout) => {}
                _ => break,
            }
        })?;

    let info = SensorInfo::new(params.get("sensorname").unwrap_or("MTK3339"), LOCATION_NAME)
        .with_description("GPS position.");

    Ok(PluginInstance::Sensor(Box::new(GpsSensor {
        info,
        latest,
        stop_tx,
        handle: Some(handle),
    })))
}
