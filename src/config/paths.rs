//! Locations of the configuration files

use anyhow::Result;
use std::path::{Path, PathBuf};

pub const SENSORS_FILE: &str = "sensors.json";
pub const OUTPUTS_FILE: &str = "outputs.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// The directory holding the four configuration files
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPaths {
    dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The per-user config directory, e.g. `~/.config/airpi`
    pub fn default_dir() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("org", "airpi", "airpi")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self::new(dirs.config_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sensors(&self) -> PathBuf {
        self.dir.join(SENSORS_FILE)
    }

    pub fn outputs(&self) -> PathBuf {
        self.dir.join(OUTPUTS_FILE)
    }

    pub fn notifications(&self) -> PathBuf {
        self.dir.join(NOTIFICATIONS_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }
}
