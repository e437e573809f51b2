//! Turning configuration sections into running plugins

use crate::config::{ConfigSource, Section};
use crate::core::connectivity::ConnectivityGate;
use crate::core::console;
use crate::core::plugin_set::PluginSet;
use crate::error::StartupError;
use airpi_core::{
    PluginCatalog, PluginContext, PluginEntry, PluginInstance, PluginParams, PluginRole,
    COMMON_SECTION,
};

/// Result of resolving one configuration file
#[derive(Debug, Default)]
pub struct Resolved {
    /// Sections that produced a plugin, in file order
    pub loaded: Vec<String>,
    /// Sections skipped because they were disabled or offline
    pub skipped: Vec<String>,
    /// Metadata text from the last output that asked for it
    pub metadata: Option<String>,
}

/// Resolves configuration sections against the plugin catalog
pub struct Resolver<'a> {
    catalog: &'a PluginCatalog,
    gate: &'a dyn ConnectivityGate,
}

fn section_flag(section: &Section, key: &str, default: bool) -> bool {
    match section.flag(key) {
        None => default,
        Some(Ok(value)) => value,
        Some(Err(text)) => {
            log::warn!(
                "Unrecognised value '{}' for '{}' in section {}; using {}",
                text,
                key,
                section.name(),
                default
            );
            default
        }
    }
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a PluginCatalog, gate: &'a dyn ConnectivityGate) -> Self {
        Self { catalog, gate }
    }

    /// Load every enabled section of `source` as a `role` plugin into
    /// `plugins`, in file order.
    ///
    /// Support plugins are instantiated before anything configured after
    /// them, so their services are in `context` by the time a dependent
    /// plugin is built.
    pub fn resolve(
        &self,
        source: &ConfigSource,
        role: PluginRole,
        context: &mut PluginContext,
        plugins: &mut PluginSet,
    ) -> Result<Resolved, StartupError> {
        let mut resolved = Resolved::default();

        for section in source.sections() {
            let name = section.name();
            if role == PluginRole::Notification && name.eq_ignore_ascii_case(COMMON_SECTION) {
                continue;
            }

            let filename = section.get("filename").ok_or_else(|| StartupError::MissingFilename {
                role,
                section: name.to_string(),
            })?;

            if !section_flag(section, "enabled", true) {
                log::info!("Skipping disabled {} plugin {}", role, name);
                resolved.skipped.push(name.to_string());
                continue;
            }

            let entry = self
                .catalog
                .lookup(role, filename)
                .map_err(|_| StartupError::UnknownPlugin {
                    role,
                    section: name.to_string(),
                    filename: filename.to_string(),
                })?;
            let params = self.collect_params(source, section, role, entry)?;

            let needs_internet = section_flag(section, "needsinternet", entry.descriptor.needs_internet);
            if needs_internet && !self.gate.is_online() {
                console::warn(&format!(
                    "Skipping {} plugin {} because no internet connectivity.",
                    role, name
                ));
                resolved.skipped.push(name.to_string());
                continue;
            }

            let is_async = section_flag(section, "async", entry.descriptor.is_async);
            let mut instance = entry
                .create(&params, context)
                .map_err(|cause| StartupError::PluginInit {
                    role,
                    section: name.to_string(),
                    cause,
                })?;

            if role == PluginRole::Output && section_flag(section, "metadatareqd", false) {
                if let PluginInstance::Output(output) = &mut instance {
                    if let Some(text) = output.output_metadata(context.metadata()) {
                        if resolved.metadata.is_some() {
                            log::debug!("Metadata from {} replaces an earlier output's", name);
                        }
                        resolved.metadata = Some(text);
                    }
                }
            }

            plugins.add(role, name, entry.descriptor, is_async, instance)?;
            console::success(&format!("Loaded {} plugin {}", role, name));
            resolved.loaded.push(name.to_string());
        }

        Ok(resolved)
    }

    fn collect_params(
        &self,
        source: &ConfigSource,
        section: &Section,
        role: PluginRole,
        entry: &PluginEntry,
    ) -> Result<PluginParams, StartupError> {
        let descriptor = entry.descriptor;
        let mut params = PluginParams::new(section.name());

        for &param in descriptor.required {
            let value = section.get(param).ok_or_else(|| StartupError::MissingParameter {
                role,
                section: section.name().to_string(),
                param: param.to_string(),
                file: source.path().to_path_buf(),
            })?;
            params.insert(param, value);
        }

        for &param in descriptor.optional {
            match section.get(param) {
                Some(value) => params.insert(param, value),
                None => log::info!(
                    "Missing optional field '{}' for {} plugin {}; using the default",
                    param,
                    role,
                    section.name()
                ),
            }
        }

        if !descriptor.common.is_empty() {
            match source.section(COMMON_SECTION) {
                Some(common) => {
                    for &param in descriptor.common {
                        if let Some(value) = common.get(param) {
                            params.insert(param, value);
                        }
                    }
                }
                None => log::info!("No {} section in {}", COMMON_SECTION, source.path().display()),
            }
        }

        Ok(params)
    }
}
