//! Pulse-counting sensors: rain gauge and anemometer
//!
//! Both are reed switches wired between a GPIO pin and ground, so each
//! bucket tip or rotation pulls the pin low. A watcher thread polls the
//! pin for falling edges and feeds a debounced [`PulseCounter`]; the
//! sample loop drains the count once per cycle.

use airpi_core::gpio::{Direction, SysfsPin, SYSFS_GPIO_ROOT};
use airpi_core::{
    PluginContext, PluginDescriptor, PluginInstance, PluginParams, PulseCounter, ReadingType,
    Sample, Sensor, SensorInfo, PULSE_DEBOUNCE, PULSE_FLOOR,
};
use anyhow::Result;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub const RAINGAUGE: PluginDescriptor = PluginDescriptor::new("raingauge", "Rain gauge")
    .description("Tipping-bucket rain gauge on a GPIO pin")
    .required(&["pinnumber"])
    .optional(&["description", "debounce", "gpioroot"]);

pub const ANEMOMETER: PluginDescriptor = PluginDescriptor::new("anemometer", "Anemometer")
    .description("Cup anemometer on a GPIO pin")
    .required(&["pinnumber"])
    .optional(&["description", "debounce", "gpioroot"]);

/// How often the watcher looks at the pin
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Background thread turning falling edges into pulses
struct EdgeWatcher {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl EdgeWatcher {
    fn spawn<F>(name: String, counter: Arc<PulseCounter>, mut read_level: F) -> Result<Self>
    where
        F: FnMut() -> Result<bool> + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // pins idle high through the pull-up
                let mut last_level = true;
                loop {
                    match stop_rx.recv_timeout(POLL_INTERVAL) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    match read_level() {
                        Ok(level) => {
                            if last_level && !level {
                                counter.pulse();
                            }
                            last_level = level;
                        }
                        Err(e) => log::debug!("{}: pin read failed: {:#}", name, e),
                    }
                }
                log::debug!("{} watcher exiting", name);
            })?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.stop_tx.try_send(());
            if handle.join().is_err() {
                log::warn!("Pulse watcher thread panicked");
            }
        }
    }
}

impl Drop for EdgeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct PulseSensor {
    info: SensorInfo,
    counter: Arc<PulseCounter>,
    watcher: EdgeWatcher,
}

impl PulseSensor {
    /// Pulses since the previous sample, plus a tiny floor so a quiet
    /// interval is still a usable non-zero number downstream
    fn take_count(&self) -> f64 {
        self.counter.drain_and_reset() + PULSE_FLOOR
    }
}

impl Sensor for PulseSensor {
    fn info(&self) -> &SensorInfo {
        &self.info
    }

    fn sample(&mut self) -> Result<Sample> {
        Ok(Sample::Value(Some(self.take_count())))
    }

    fn stop(&mut self) {
        self.watcher.stop();
    }
}

fn create_pulse_sensor(
    params: &PluginParams,
    sensor_name: &str,
    value_name: &str,
    default_description: &str,
) -> Result<PluginInstance> {
    let pin: u32 = params.parse_required("pinnumber")?;
    let debounce = params
        .parse::<u64>("debounce")?
        .map(Duration::from_millis)
        .unwrap_or(PULSE_DEBOUNCE);
    let root = params.get("gpioroot").unwrap_or(SYSFS_GPIO_ROOT);

    let gpio = SysfsPin::open_at(Path::new(root), pin, Direction::In)?;
    let counter = Arc::new(PulseCounter::new(debounce));
    let watcher = EdgeWatcher::spawn(
        format!("{}-gpio{}", sensor_name.to_lowercase(), pin),
        counter.clone(),
        move || gpio.read(),
    )?;
    log::info!("{} counting pulses on GPIO {}", sensor_name, pin);

    let info = SensorInfo::new(sensor_name, value_name)
        .with_reading_type(ReadingType::PulseCount)
        .with_description(params.get("description").unwrap_or(default_description));

    Ok(PluginInstance::Sensor(Box::new(PulseSensor {
        info,
        counter,
        watcher,
    })))
}

pub fn create_raingauge(params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
    create_pulse_sensor(params, "Raingauge", "Bucket_tips", "A rain gauge.")
}

pub fn create_anemometer(params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
    create_pulse_sensor(params, "Anemometer", "Rotations", "An anemometer.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;

    fn fake_gpio(pin: u32) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(format!("gpio{}", pin));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("value"), "1").unwrap();
        root
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_quiet_interval_reports_floor() {
        let root = fake_gpio(17);
        let params = PluginParams::new("Raingauge")
            .with("pinnumber", "17")
            .with("gpioroot", root.path().to_string_lossy());
        let mut context = PluginContext::default();

        let PluginInstance::Sensor(mut sensor) = create_raingauge(&params, &mut context).unwrap() else {
            panic!("expected a sensor");
        };
        assert_eq!(sensor.info().value_name, "Bucket_tips");
        assert_eq!(sensor.info().reading_type, ReadingType::PulseCount);
        assert_eq!(sensor.sample().unwrap(), Sample::Value(Some(PULSE_FLOOR)));
        sensor.stop();
    }

    #[test]
    fn test_falling_edge_counted_once_then_reset() {
        let root = fake_gpio(27);
        let value = root.path().join("gpio27").join("value");
        let params = PluginParams::new("Anemometer")
            .with("pinnumber", "27")
            .with("debounce", "0")
            .with("gpioroot", root.path().to_string_lossy());
        let mut context = PluginContext::default();

        let PluginInstance::Sensor(mut sensor) = create_anemometer(&params, &mut context).unwrap() else {
            panic!("expected a sensor");
        };

        fs::write(&value, "0").unwrap();
        let mut first = None;
        assert!(wait_for(|| {
            if let Ok(Sample::Value(Some(v))) = sensor.sample() {
                if v > 0.5 {
                    first = Some(v);
                    return true;
                }
            }
            false
        }));
        assert_eq!(first, Some(1.0 + PULSE_FLOOR));

        // pin held low: no new edge
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sensor.sample().unwrap(), Sample::Value(Some(PULSE_FLOOR)));
        sensor.stop();
    }

    #[test]
    fn test_missing_pin_number() {
        let params = PluginParams::new("Raingauge");
        let mut context = PluginContext::default();
        assert!(create_raingauge(&params, &mut context).is_err());
    }
}
