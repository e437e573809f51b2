//! Resolved plugin parameters

use crate::error::PluginError;
use std::collections::HashMap;
use std::str::FromStr;

/// Interpret common boolean spellings found in config files.
///
/// Returns `None` when the text is not a recognised boolean.
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parameter mapping handed to a plugin factory
///
/// Keys are the names the plugin's descriptor declares; values are the
/// raw text from the configuration. Optional parameters that were not
/// configured are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginParams {
    plugin: String,
    values: HashMap<String, String>,
}

impl PluginParams {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            values: HashMap::new(),
        }
    }

    /// Name of the config section these parameters came from
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert, handy in tests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a parameter that must be present
    pub fn require(&self, key: &str) -> Result<&str, PluginError> {
        self.get(key).ok_or_else(|| PluginError::MissingParameter {
            plugin: self.plugin.clone(),
            param: key.to_string(),
        })
    }

    /// Boolean parameter; missing or unrecognised values read as false
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(parse_flag).unwrap_or(false)
    }

    /// Parse an optional parameter
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, PluginError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.invalid(key, text, e.to_string())),
        }
    }

    /// Parse an optional parameter, falling back to `default` when absent
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, PluginError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse(key)?.unwrap_or(default))
    }

    /// Parse a parameter that must be present
    pub fn parse_required<T>(&self, key: &str) -> Result<T, PluginError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let text = self.require(key)?;
        text.trim()
            .parse::<T>()
            .map_err(|e| self.invalid(key, text, e.to_string()))
    }

    /// Build an `InvalidParameter` error for this plugin
    pub fn invalid(&self, key: &str, value: &str, reason: impl Into<String>) -> PluginError {
        PluginError::InvalidParameter {
            plugin: self.plugin.clone(),
            param: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
