//! Station startup: settings, plugins and the scheduler that drives them

use crate::config::{ConfigPaths, ConfigSource, Settings};
use crate::core::connectivity::ConnectivityGate;
use crate::core::console;
use crate::core::indicator::Indicators;
use crate::core::metadata;
use crate::core::plugin_set::PluginSet;
use crate::core::resolver::Resolver;
use crate::core::scheduler::Scheduler;
use crate::error::StartupError;
use airpi_core::{PluginCatalog, PluginContext, PluginRole, RunMetadata};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Timelike};
use std::path::Path;
use std::time::Duration;

/// A fully configured station, ready to sample
pub struct Station {
    pub settings: Settings,
    pub metadata: RunMetadata,
    pub plugins: PluginSet,
    /// Run metadata as rendered by the last output that asked for it
    pub banner: Option<String>,
}

fn resolve_file(
    resolver: &Resolver<'_>,
    path: &Path,
    role: PluginRole,
    context: &mut PluginContext,
    plugins: &mut PluginSet,
) -> Result<Option<String>, StartupError> {
    let source = ConfigSource::load(path)?;
    log::debug!("Loading {} plugins from {}", role, path.display());
    let resolved = resolver.resolve(&source, role, context, plugins)?;
    log::info!(
        "{} {} plugin(s) loaded, {} skipped",
        resolved.loaded.len(),
        role,
        resolved.skipped.len()
    );
    Ok(resolved.metadata)
}

impl Station {
    /// Read the configuration in `paths` and build every plugin.
    ///
    /// Sensors are built first, then outputs, then notifications, each in
    /// file order. Any configuration problem ends startup.
    pub fn assemble(
        paths: &ConfigPaths,
        catalog: &PluginCatalog,
        gate: &dyn ConnectivityGate,
    ) -> Result<Self, StartupError> {
        let settings = Settings::load(&paths.settings())?;
        let metadata = metadata::collect(&settings.operator);
        log::info!("Run {} on {} ({})", metadata.run_id, metadata.pi_name, metadata.pi_id);

        let mut context = PluginContext::new(metadata.clone());
        let mut plugins = PluginSet::new();
        let resolver = Resolver::new(catalog, gate);

        resolve_file(&resolver, &paths.sensors(), PluginRole::Sensor, &mut context, &mut plugins)?;
        let banner = resolve_file(&resolver, &paths.outputs(), PluginRole::Output, &mut context, &mut plugins)?;
        if plugins.outputs().is_empty() {
            return Err(StartupError::NoOutputs);
        }
        resolve_file(
            &resolver,
            &paths.notifications(),
            PluginRole::Notification,
            &mut context,
            &mut plugins,
        )?;

        Ok(Self {
            settings,
            metadata,
            plugins,
            banner,
        })
    }

    /// Print the metadata banner, if an output produced one
    pub fn announce(&self) {
        if let Some(banner) = &self.banner {
            println!("{}", banner);
        }
        console::success("Setup complete.");
    }

    /// Open the status LEDs and hand everything to a scheduler
    pub fn into_scheduler(self) -> Result<Scheduler> {
        let settings = &self.settings;
        let indicators = Indicators::from_pins(
            settings.green_pin,
            settings.red_pin,
            settings.success_led,
            settings.fail_led,
        )
        .context("Failed to set up the status LEDs")?;
        Ok(Scheduler::new(self.plugins, indicators, settings))
    }
}

/// Time from `now` to the start of the next full minute
pub fn delay_to_next_minute(now: DateTime<Local>) -> Duration {
    let into_minute = Duration::from_secs(u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond().min(999_999_999)));
    Duration::from_secs(60).saturating_sub(into_minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NOTIFICATIONS_FILE, OUTPUTS_FILE, SENSORS_FILE, SETTINGS_FILE};
    use crate::core::connectivity::tests::FixedGate;
    use chrono::TimeZone;
    use std::fs;

    fn write_config(dir: &Path, outputs: &str) {
        fs::write(dir.join(SETTINGS_FILE), r#"{ "Main": { "sampleFreq": 10, "operator": "Alice" } }"#).unwrap();
        fs::write(
            dir.join(SENSORS_FILE),
            r#"{ "Test": { "filename": "test", "enabled": true } }"#,
        )
        .unwrap();
        fs::write(dir.join(OUTPUTS_FILE), outputs).unwrap();
        fs::write(dir.join(NOTIFICATIONS_FILE), r#"{ "Common": {} }"#).unwrap();
    }

    #[test]
    fn test_assemble_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{ "Print": { "filename": "print", "format": "friendly", "metadatareqd": true } }"#,
        );

        let catalog = crate::build_catalog();
        let station = Station::assemble(&ConfigPaths::new(dir.path()), &catalog, &FixedGate::new(true)).unwrap();
        assert_eq!(station.settings.sample_interval, Duration::from_secs(10));
        assert_eq!(station.metadata.operator, "Alice");
        assert_eq!(station.plugins.sensors().len(), 1);
        assert_eq!(station.plugins.outputs().len(), 1);
        assert!(station.banner.as_deref().unwrap_or_default().contains("Alice"));
    }

    #[test]
    fn test_no_outputs_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{ "Print": { "filename": "print", "format": "friendly", "enabled": false } }"#,
        );

        let catalog = crate::build_catalog();
        let result = Station::assemble(&ConfigPaths::new(dir.path()), &catalog, &FixedGate::new(true));
        assert!(matches!(result, Err(StartupError::NoOutputs)));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = crate::build_catalog();
        let result = Station::assemble(&ConfigPaths::new(dir.path()), &catalog, &FixedGate::new(true));
        assert!(matches!(result, Err(StartupError::MissingConfigFile { .. })));
    }

    #[test]
    fn test_next_minute() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
        assert_eq!(delay_to_next_minute(now), Duration::from_secs(15));
        let on_the_minute = Local.with_ymd_and_hms(2024, 5, 1, 12, 31, 0).unwrap();
        assert_eq!(delay_to_next_minute(on_the_minute), Duration::from_secs(60));
    }
}
