//! Sectioned configuration files
//!
//! Each file is a JSON object of named sections, kept in file order:
//!
//! ```json
//! {
//!   "BMP085-temp": { "filename": "bmp085", "enabled": true, "measurement": "temperature" },
//!   "LDR": { "filename": "analogue", "adcPin": 0, "pullDownResistance": 10000 }
//! }
//! ```
//!
//! Keys are matched case-insensitively and every scalar value is kept as
//! text, so `"enabled": "on"`, `"enabled": true` and `"Enabled": "yes"`
//! all mean the same thing.

use crate::error::StartupError;
use airpi_core::parse_flag;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// One named section of a configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    values: HashMap<String, String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// Builder used by tests and defaults
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_ascii_lowercase())
    }

    /// Boolean value of `key`: `None` if absent, `Some(Err(text))` if it
    /// is present but not a recognised flag spelling
    pub fn flag(&self, key: &str) -> Option<Result<bool, &str>> {
        self.get(key).map(|text| parse_flag(text).ok_or(text))
    }
}

/// A JSON object's entries in document order, repeated keys included.
///
/// `serde_json::Map` keeps only the last of two equal keys, which would
/// silently drop a section.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entries<V>, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// A parsed configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    path: PathBuf,
    sections: Vec<Section>,
}

impl ConfigSource {
    /// Load and parse `path`
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.is_file() {
            return Err(StartupError::MissingConfigFile {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|_| StartupError::MissingConfigFile {
            path: path.to_path_buf(),
        })?;
        Self::parse(path, &text)
    }

    /// Parse `text`; `path` is only used in messages
    pub fn parse(path: &Path, text: &str) -> Result<Self, StartupError> {
        let malformed = |reason: String| StartupError::MalformedConfig {
            path: path.to_path_buf(),
            reason,
        };

        let Entries(root): Entries<Entries<Value>> = serde_json::from_str(text)
            .map_err(|e| malformed(format!("expected an object of section objects: {}", e)))?;

        let mut sections: Vec<Section> = Vec::with_capacity(root.len());
        for (name, body) in root {
            if sections.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
                return Err(malformed(format!("section '{}' appears more than once", name)));
            }
            let Entries(body) = body;
            let mut section = Section::new(name.clone());
            for (key, value) in body {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => continue,
                    Value::Array(_) | Value::Object(_) => {
                        return Err(malformed(format!(
                            "value of '{}' in section '{}' must be a string, number or boolean",
                            key, name
                        )))
                    }
                };
                if section.contains(&key) {
                    log::warn!("Key '{}' appears twice in section '{}' of {}", key, name, path.display());
                }
                section.values.insert(key.to_ascii_lowercase(), text);
            }
            sections.push(section);
        }

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }

    pub fn from_sections(path: impl Into<PathBuf>, sections: Vec<Section>) -> Self {
        Self {
            path: path.into(),
            sections,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sections in file order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}
