//! Errors raised while building plugins

use crate::role::PluginRole;
use thiserror::Error;

/// Errors raised by the catalog, parameter access and shared services
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no {role} plugin named '{filename}' is registered")]
    UnknownPlugin { role: PluginRole, filename: String },

    #[error("missing required parameter '{param}' for plugin {plugin}")]
    MissingParameter { plugin: String, param: String },

    #[error("invalid value '{value}' for parameter '{param}' of plugin {plugin}: {reason}")]
    InvalidParameter {
        plugin: String,
        param: String,
        value: String,
        reason: String,
    },

    #[error("plugin {plugin} needs the shared {service}, but no plugin has provided one")]
    MissingService { plugin: String, service: &'static str },
}
