//! Startup errors
//!
//! Anything that goes wrong before the sample loop starts ends the run.
//! The messages are printed as well as logged, so they name the section
//! and file the operator has to fix.

use airpi_core::PluginRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Unable to access config file: {}", path.display())]
    MissingConfigFile { path: PathBuf },

    #[error("Malformed config file {}: {reason}", path.display())]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("No filename config option found for {role} plugin {section}")]
    MissingFilename { role: PluginRole, section: String },

    #[error("Could not find a {role} plugin called '{filename}' for section {section}")]
    UnknownPlugin {
        role: PluginRole,
        section: String,
        filename: String,
    },

    #[error(
        "Missing required field '{param}' for {role} plugin {section}. This should be found in file: {}",
        file.display()
    )]
    MissingParameter {
        role: PluginRole,
        section: String,
        param: String,
        file: PathBuf,
    },

    #[error("Failed to set up {role} plugin {section}: {cause:#}")]
    PluginInit {
        role: PluginRole,
        section: String,
        cause: anyhow::Error,
    },

    #[error("Duplicate {role} plugin name '{name}'")]
    DuplicatePlugin { role: PluginRole, name: String },

    #[error("Invalid value '{value}' for setting '{key}': {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("No output plugins selected")]
    NoOutputs,
}
