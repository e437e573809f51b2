//! Configuration management

mod paths;
mod settings;
mod source;

pub use paths::{ConfigPaths, NOTIFICATIONS_FILE, OUTPUTS_FILE, SENSORS_FILE, SETTINGS_FILE};
pub use settings::Settings;
pub use source::{ConfigSource, Section};
