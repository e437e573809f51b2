//! The sample loop
//!
//! Each cycle reads every sensor in registration order into a [`Frame`],
//! judges the readings, hands the frame to every output, raises alerts
//! and drives the status LEDs. Cycles start `sample_interval` apart,
//! measured from the start of the previous cycle.

use crate::config::Settings;
use crate::core::console;
use crate::core::indicator::Indicators;
use crate::core::plugin_set::PluginSet;
use airpi_core::{
    Frame, NotificationEvent, Reading, Sample, INDICATOR_PULSE, SLEEP_GUARD_BAND,
};
use airpi_types::{is_healthy_value, LocationReading, ValueReading};
use anyhow::{Context, Result};
use chrono::Local;
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// What a sensor error does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorFailurePolicy {
    /// Stop sampling
    #[default]
    Abort,
    /// Record an empty reading and carry on
    Degrade,
}

impl FromStr for SensorFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(SensorFailurePolicy::Abort),
            "degrade" => Ok(SensorFailurePolicy::Degrade),
            other => Err(format!("unknown sensor failure policy '{}'", other)),
        }
    }
}

/// How one cycle went
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub readings: usize,
    /// Every scalar reading passed the health check
    pub sensors_healthy: bool,
    /// Every output reported success
    pub outputs_healthy: bool,
    /// Output whose error cut this cycle's dispatch short
    pub output_error: Option<String>,
}

pub struct Scheduler {
    plugins: PluginSet,
    indicators: Indicators,
    interval: Duration,
    pulse: Duration,
    print_errors: bool,
    policy: SensorFailurePolicy,
    cycle: u64,
}

impl Scheduler {
    pub fn new(plugins: PluginSet, indicators: Indicators, settings: &Settings) -> Self {
        Self {
            plugins,
            indicators,
            interval: settings.sample_interval,
            pulse: INDICATOR_PULSE,
            print_errors: settings.print_errors,
            policy: settings.sensor_failure,
            cycle: 0,
        }
    }

    /// Override how long the status LEDs stay lit
    pub fn with_pulse(mut self, pulse: Duration) -> Self {
        self.pulse = pulse;
        self
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    /// Read every sensor. The frame is stamped once the last read is done.
    fn collect(&mut self) -> Result<(Frame, bool)> {
        let mut readings = Vec::with_capacity(self.plugins.sensors().len());
        let mut healthy = true;
        let gps = self.plugins.gps_index();
        let policy = self.policy;

        for (index, sensor) in self.plugins.sensors_mut().iter_mut().enumerate() {
            let sample = match sensor.plugin.sample() {
                Ok(sample) => sample,
                Err(e) => match policy {
                    SensorFailurePolicy::Abort => {
                        return Err(e).with_context(|| format!("Sensor {} failed", sensor.name));
                    }
                    SensorFailurePolicy::Degrade => {
                        log::error!("Sensor {} failed: {:#}", sensor.name, e);
                        Sample::Value(None)
                    }
                },
            };

            match sample {
                Sample::Location(fix) => {
                    if Some(index) == gps {
                        log::debug!(
                            "GPS {}: {}, {}, {}",
                            sensor.name,
                            fix.latitude,
                            fix.longitude,
                            fix.altitude
                        );
                    }
                    if !fix.has_position() {
                        log::debug!("No position fix from {} yet; leaving it out", sensor.name);
                        continue;
                    }
                    let name = sensor.plugin.info().sensor_name.clone();
                    readings.push(Reading::Location(LocationReading::from_fix(name, &fix)));
                }
                Sample::Value(value) => {
                    if !is_healthy_value(value) {
                        log::debug!("Unhealthy reading {:?} from {}", value, sensor.name);
                        healthy = false;
                    }
                    let info = sensor.plugin.info();
                    readings.push(Reading::Value(ValueReading {
                        name: info.value_name.clone(),
                        sensor: info.sensor_name.clone(),
                        value,
                        unit: info.unit.clone(),
                        symbol: info.symbol.clone(),
                        description: info.description.clone(),
                        reading_type: info.reading_type,
                    }));
                }
            }
        }

        let mut frame = Frame::new(self.cycle, Local::now());
        frame.readings = readings;
        Ok((frame, healthy))
    }

    fn notify(&mut self, event: NotificationEvent) {
        for notification in self.plugins.notifications_mut() {
            if let Err(e) = notification.plugin.send_notification(event) {
                log::warn!("Notification {} failed to send {}: {:#}", notification.name, event, e);
            }
        }
    }

    fn report_failure(&self, message: &str) {
        if self.print_errors {
            console::error(message);
        } else {
            log::error!("{}", message);
        }
    }

    /// Run one cycle without the LED settle.
    ///
    /// Returns `Err` only when a sensor fails under the abort policy.
    pub fn sample_once(&mut self) -> Result<CycleOutcome> {
        self.cycle += 1;
        let (frame, sensors_healthy) = self.collect()?;
        let mut outcome = CycleOutcome {
            cycle: self.cycle,
            readings: frame.len(),
            sensors_healthy,
            outputs_healthy: true,
            output_error: None,
        };

        if sensors_healthy {
            log::info!("Success: Data obtained from all sensors.");
        } else {
            self.report_failure("Failed to obtain data from all sensors.");
            self.notify(NotificationEvent::AlertSensor);
        }

        for output in self.plugins.outputs_mut() {
            match output.plugin.output_data(&frame) {
                Ok(ok) => outcome.outputs_healthy &= ok,
                Err(e) => {
                    log::error!("Exception: output {} failed: {:#}", output.name, e);
                    outcome.outputs_healthy = false;
                    outcome.output_error = Some(output.name.clone());
                    return Ok(outcome);
                }
            }
        }

        if outcome.outputs_healthy {
            log::info!("Success: Data output in all requested formats.");
            self.indicators.signal_success();
        } else {
            self.report_failure("Failed to output in all requested formats.");
            self.notify(NotificationEvent::AlertOutput);
            self.indicators.signal_failure();
        }

        Ok(outcome)
    }

    /// Stop background work and switch the LEDs off
    pub fn shutdown(&mut self) {
        self.plugins.stop_sensors();
        self.indicators.all_off();
    }

    /// Sample until `stop` completes.
    ///
    /// Returns `Ok` once `stop` fires and `Err` when a sensor aborts the
    /// run; sensors are stopped and the LEDs switched off either way.
    pub async fn run<F>(mut self, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut last_start: Option<Instant> = None;

        loop {
            let due = last_start.map_or(true, |start| start.elapsed() >= self.interval);
            if due {
                last_start = Some(Instant::now());
                let outcome = match self.sample_once() {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        self.shutdown();
                        return Err(e);
                    }
                };
                log::debug!("Cycle {} done: {:?}", outcome.cycle, outcome);

                if outcome.output_error.is_none() {
                    tokio::select! {
                        _ = &mut stop => break,
                        _ = tokio::time::sleep(self.pulse) => {}
                    }
                    self.indicators.settle();
                }
            }

            let pause = last_start
                .and_then(|start| self.interval.checked_sub(start.elapsed()))
                .and_then(|remaining| remaining.checked_sub(SLEEP_GUARD_BAND));
            match pause {
                Some(pause) => {
                    tokio::select! {
                        _ = &mut stop => break,
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
                None => {
                    tokio::select! {
                        _ = &mut stop => break,
                        _ = tokio::task::yield_now() => {}
                    }
                }
            }
        }

        self.shutdown();
        console::info("Stopping sampling as requested...");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indicator::tests::RecordingLight;
    use crate::core::indicator::LedMode;
    use airpi_core::{Fix, Notification, Output, PluginDescriptor, PluginInstance, PluginRole, Sensor, SensorInfo};
    use airpi_types::{Disposition, Exposure};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    type Script = Box<dyn FnMut() -> Result<Sample> + Send>;

    struct ScriptedSensor {
        info: SensorInfo,
        script: Script,
        stopped: Arc<AtomicBool>,
    }

    impl Sensor for ScriptedSensor {
        fn info(&self) -> &SensorInfo {
            &self.info
        }
        fn sample(&mut self) -> Result<Sample> {
            (self.script)()
        }
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Report(bool),
        Fail,
        /// Report failure on the first frame, raise on every later one
        ReportThenFail,
    }

    struct RecordingOutput {
        frames: Arc<Mutex<Vec<Frame>>>,
        behaviour: Behaviour,
    }

    impl Output for RecordingOutput {
        fn output_data(&mut self, frame: &Frame) -> Result<bool> {
            let seen = {
                let mut frames = self.frames.lock().unwrap();
                frames.push(frame.clone());
                frames.len()
            };
            match self.behaviour {
                Behaviour::Report(ok) => Ok(ok),
                Behaviour::Fail => anyhow::bail!("disk full"),
                Behaviour::ReportThenFail if seen == 1 => Ok(false),
                Behaviour::ReportThenFail => anyhow::bail!("disk full"),
            }
        }
    }

    struct RecordingNotification(Arc<Mutex<Vec<NotificationEvent>>>);

    impl Notification for RecordingNotification {
        fn send_notification(&mut self, event: NotificationEvent) -> Result<()> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn failing(message: &'static str) -> Script {
        Box::new(move || -> Result<Sample> { Err(anyhow::anyhow!(message)) })
    }

    const PLAIN: PluginDescriptor = PluginDescriptor::new("plain", "Plain");
    const GPS: PluginDescriptor = PluginDescriptor::new("gpsd", "GPS").reports_location();

    /// Station under test with handles on everything it touches
    struct Rig {
        plugins: PluginSet,
        stopped: Arc<AtomicBool>,
        frames: Vec<Arc<Mutex<Vec<Frame>>>>,
        events: Arc<Mutex<Vec<NotificationEvent>>>,
        green: RecordingLight,
        red: RecordingLight,
    }

    impl Rig {
        fn new() -> Self {
            let events = Arc::new(Mutex::new(Vec::new()));
            let mut plugins = PluginSet::new();
            plugins
                .add(
                    PluginRole::Notification,
                    "Alert",
                    &PLAIN,
                    false,
                    PluginInstance::Notification(Box::new(RecordingNotification(events.clone()))),
                )
                .unwrap();
            Self {
                plugins,
                stopped: Arc::new(AtomicBool::new(false)),
                frames: Vec::new(),
                events,
                green: RecordingLight::default(),
                red: RecordingLight::default(),
            }
        }

        fn sensor(mut self, name: &str, value_name: &str, script: Script) -> Self {
            let descriptor = if value_name == "Location" { &GPS } else { &PLAIN };
            let sensor = ScriptedSensor {
                info: SensorInfo::new(name, value_name).with_unit("Celsius", "C"),
                script,
                stopped: self.stopped.clone(),
            };
            self.plugins
                .add(PluginRole::Sensor, name, descriptor, false, PluginInstance::Sensor(Box::new(sensor)))
                .unwrap();
            self
        }

        fn value(self, name: &str, value: Option<f64>) -> Self {
            self.sensor(name, name, Box::new(move || -> Result<Sample> { Ok(Sample::Value(value)) }))
        }

        fn output(mut self, name: &str, behaviour: Behaviour) -> Self {
            let frames = Arc::new(Mutex::new(Vec::new()));
            self.frames.push(frames.clone());
            self.plugins
                .add(
                    PluginRole::Output,
                    name,
                    &PLAIN,
                    false,
                    PluginInstance::Output(Box::new(RecordingOutput { frames, behaviour })),
                )
                .unwrap();
            self
        }

        fn scheduler(self, settings: &Settings) -> (Scheduler, Handles) {
            let indicators = Indicators::new(
                Some(Box::new(self.green.clone())),
                Some(Box::new(self.red.clone())),
                settings.success_led,
                settings.fail_led,
            );
            let handles = Handles {
                stopped: self.stopped,
                frames: self.frames,
                events: self.events,
                green: self.green,
                red: self.red,
            };
            let scheduler = Scheduler::new(self.plugins, indicators, settings).with_pulse(Duration::from_millis(1));
            (scheduler, handles)
        }
    }

    struct Handles {
        stopped: Arc<AtomicBool>,
        frames: Vec<Arc<Mutex<Vec<Frame>>>>,
        events: Arc<Mutex<Vec<NotificationEvent>>>,
        green: RecordingLight,
        red: RecordingLight,
    }

    impl Handles {
        fn frames(&self, output: usize) -> Vec<Frame> {
            self.frames[output].lock().unwrap().clone()
        }

        fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Degrade".parse::<SensorFailurePolicy>(), Ok(SensorFailurePolicy::Degrade));
        assert_eq!(" abort".parse::<SensorFailurePolicy>(), Ok(SensorFailurePolicy::Abort));
        assert!("retry".parse::<SensorFailurePolicy>().is_err());
    }

    #[test]
    fn test_zero_reading_raises_one_sensor_alert() {
        let (mut scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .value("Volume", Some(0.0))
            .output("Print", Behaviour::Report(true))
            .output("CSV", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let outcome = scheduler.sample_once().unwrap();
        assert!(!outcome.sensors_healthy);
        assert!(outcome.outputs_healthy);
        assert_eq!(outcome.readings, 2);
        assert_eq!(handles.events(), vec![NotificationEvent::AlertSensor]);

        // both outputs see the same frame, in sensor order
        for output in 0..2 {
            let frames = handles.frames(output);
            assert_eq!(frames.len(), 1);
            let values: Vec<_> = frames[0].iter().map(|r| r.value()).collect();
            assert_eq!(values, vec![Some(21.6), Some(0.0)]);
        }
        assert!(handles.green.is_on());
        assert!(!handles.red.is_on());
    }

    #[test]
    fn test_location_without_fix_left_out() {
        let (mut scheduler, handles) = Rig::new()
            .sensor("MTK3339", "Location", Box::new(|| -> Result<Sample> { Ok(Sample::Location(Fix::none())) }))
            .value("Temperature", Some(21.6))
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let outcome = scheduler.sample_once().unwrap();
        assert!(outcome.sensors_healthy);
        let frame = &handles.frames(0)[0];
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.readings[0].name(), "Temperature");
    }

    #[test]
    fn test_location_with_fix_included() {
        let fix = Fix {
            latitude: 53.38,
            longitude: -1.47,
            altitude: 120.0,
            disposition: Disposition::Fixed,
            exposure: Exposure::Indoor,
        };
        let (mut scheduler, handles) = Rig::new()
            .sensor("MTK3339", "Location", Box::new(move || -> Result<Sample> { Ok(Sample::Location(fix)) }))
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let outcome = scheduler.sample_once().unwrap();
        // location readings never count against sensor health
        assert!(outcome.sensors_healthy);
        let frame = &handles.frames(0)[0];
        assert_eq!(frame.readings[0].name(), "Location");
        assert_eq!(frame.readings[0].sensor(), "MTK3339");
    }

    #[test]
    fn test_failed_output_raises_one_output_alert() {
        let (mut scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .output("Print", Behaviour::Report(false))
            .output("CSV", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let outcome = scheduler.sample_once().unwrap();
        assert!(!outcome.outputs_healthy);
        assert!(outcome.output_error.is_none());
        assert_eq!(handles.frames(1).len(), 1);
        assert_eq!(handles.events(), vec![NotificationEvent::AlertOutput]);
        assert!(handles.red.is_on());
        assert!(!handles.green.is_on());
    }

    #[test]
    fn test_output_error_cuts_dispatch_short() {
        let (mut scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .output("Broken", Behaviour::Fail)
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let outcome = scheduler.sample_once().unwrap();
        assert_eq!(outcome.output_error.as_deref(), Some("Broken"));
        assert!(handles.frames(1).is_empty());
        assert!(handles.events().is_empty());
        assert!(handles.green.history().is_empty());
        assert!(handles.red.history().is_empty());
    }

    #[test]
    fn test_sensor_error_aborts_by_default() {
        let (mut scheduler, handles) = Rig::new()
            .sensor("DHT22", "Temperature", failing("checksum mismatch"))
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let err = scheduler.sample_once().unwrap_err();
        assert!(format!("{:#}", err).contains("checksum mismatch"));
        assert!(handles.frames(0).is_empty());
    }

    #[test]
    fn test_sensor_error_degrades_when_asked() {
        let settings = Settings {
            sensor_failure: SensorFailurePolicy::Degrade,
            ..Settings::default()
        };
        let (mut scheduler, handles) = Rig::new()
            .sensor("DHT22", "Temperature", failing("checksum mismatch"))
            .value("Pressure", Some(1013.0))
            .output("Print", Behaviour::Report(true))
            .scheduler(&settings);

        let outcome = scheduler.sample_once().unwrap();
        assert!(!outcome.sensors_healthy);
        let values: Vec<_> = handles.frames(0)[0].iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![None, Some(1013.0)]);
    }

    #[test]
    fn test_cycles_are_numbered() {
        let (mut scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        scheduler.sample_once().unwrap();
        scheduler.sample_once().unwrap();
        let cycles: Vec<_> = handles.frames(0).iter().map(|f| f.cycle).collect();
        assert_eq!(cycles, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_run_until_stopped() {
        let settings = Settings {
            sample_interval: Duration::from_millis(40),
            ..Settings::default()
        };
        let (scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .output("Print", Behaviour::Report(true))
            .scheduler(&settings);

        scheduler
            .run(tokio::time::sleep(Duration::from_millis(150)))
            .await
            .unwrap();

        let cycles = handles.frames(0).len();
        assert!((2..=5).contains(&cycles), "{cycles} cycles");
        assert!(handles.stopped.load(Ordering::SeqCst));
        assert!(!handles.green.is_on());
    }

    #[tokio::test]
    async fn test_run_ends_on_sensor_abort() {
        let (scheduler, handles) = Rig::new()
            .sensor("DHT22", "Temperature", failing("gone"))
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        assert!(scheduler.run(std::future::pending()).await.is_err());
        assert!(handles.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_output_error_does_not_end_run() {
        let settings = Settings {
            sample_interval: Duration::from_millis(30),
            fail_led: LedMode::Constant,
            ..Settings::default()
        };
        let (scheduler, handles) = Rig::new()
            .value("Temperature", Some(21.6))
            .output("CSV", Behaviour::ReportThenFail)
            .scheduler(&settings);

        scheduler
            .run(tokio::time::sleep(Duration::from_millis(120)))
            .await
            .unwrap();

        assert!(handles.frames(0).len() > 1);
        assert_eq!(handles.events(), vec![NotificationEvent::AlertOutput]);
        // lit by the first cycle, left alone by the raising ones, off at shutdown
        assert_eq!(handles.red.history(), vec![true, false]);
        assert!(handles.green.history().iter().all(|on| !on));
    }

    #[test]
    fn test_frame_stamped_after_last_read() {
        let (mut scheduler, handles) = Rig::new()
            .sensor(
                "DHT22",
                "Temperature",
                Box::new(|| -> Result<Sample> {
                    std::thread::sleep(Duration::from_millis(20));
                    Ok(Sample::Value(Some(21.6)))
                }),
            )
            .output("Print", Behaviour::Report(true))
            .scheduler(&Settings::default());

        let before = Local::now();
        scheduler.sample_once().unwrap();
        let frame = &handles.frames(0)[0];
        assert!(frame.sampled_at - before >= chrono::Duration::milliseconds(20));
    }
}
