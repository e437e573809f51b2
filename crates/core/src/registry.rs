//! Catalog of plugin factories

use crate::context::PluginContext;
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;
use crate::params::PluginParams;
use crate::plugin::PluginInstance;
use crate::role::PluginRole;
use anyhow::Result;
use std::collections::HashMap;

/// Function that creates a plugin from its resolved parameters
pub type PluginFactory = fn(&PluginParams, &mut PluginContext) -> Result<PluginInstance>;

/// A registered plugin type
#[derive(Clone, Copy)]
pub struct PluginEntry {
    pub descriptor: &'static PluginDescriptor,
    pub factory: PluginFactory,
}

impl PluginEntry {
    pub fn create(&self, params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
        (self.factory)(params, context)
    }
}

/// Catalog of plugin types, keyed by role and `filename`
///
/// Each plugin crate registers its built-in plugins at startup; the
/// resolver then looks sections up here instead of searching for types at
/// runtime.
pub struct PluginCatalog {
    entries: HashMap<(PluginRole, String), PluginEntry>,
}

impl PluginCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a plugin type under its descriptor id
    pub fn register(
        &mut self,
        role: PluginRole,
        descriptor: &'static PluginDescriptor,
        factory: PluginFactory,
    ) {
        let key = (role, descriptor.id.to_ascii_lowercase());
        if self.entries.contains_key(&key) {
            log::warn!("Replacing registered {} plugin '{}'", role, descriptor.id);
        }
        self.entries.insert(key, PluginEntry { descriptor, factory });
    }

    pub fn register_sensor(&mut self, descriptor: &'static PluginDescriptor, factory: PluginFactory) {
        self.register(PluginRole::Sensor, descriptor, factory);
    }

    pub fn register_output(&mut self, descriptor: &'static PluginDescriptor, factory: PluginFactory) {
        self.register(PluginRole::Output, descriptor, factory);
    }

    pub fn register_notification(
        &mut self,
        descriptor: &'static PluginDescriptor,
        factory: PluginFactory,
    ) {
        self.register(PluginRole::Notification, descriptor, factory);
    }

    /// Look up a plugin type by role and `filename`
    pub fn lookup(&self, role: PluginRole, filename: &str) -> Result<&PluginEntry, PluginError> {
        self.entries
            .get(&(role, filename.trim().to_ascii_lowercase()))
            .ok_or_else(|| PluginError::UnknownPlugin {
                role,
                filename: filename.to_string(),
            })
    }

    /// Descriptors registered for a role, sorted by id
    pub fn list(&self, role: PluginRole) -> Vec<&'static PluginDescriptor> {
        let mut descriptors: Vec<_> = self
            .entries
            .iter()
            .filter(|((r, _), _)| *r == role)
            .map(|(_, entry)| entry.descriptor)
            .collect();
        descriptors.sort_by_key(|d| d.id);
        descriptors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: PluginDescriptor = PluginDescriptor::new("Marker", "Marker").support();

    fn make_marker(_params: &PluginParams, _context: &mut PluginContext) -> Result<PluginInstance> {
        Ok(PluginInstance::Support(Box::new(())))
    }

    #[test]
    fn test_lookup_is_per_role_and_case_insensitive() {
        let mut catalog = PluginCatalog::new();
        catalog.register_output(&MARKER, make_marker);

        assert!(catalog.lookup(PluginRole::Output, "marker").is_ok());
        assert!(catalog.lookup(PluginRole::Output, " MARKER ").is_ok());
        assert!(matches!(
            catalog.lookup(PluginRole::Sensor, "marker"),
            Err(PluginError::UnknownPlugin { role: PluginRole::Sensor, .. })
        ));
    }

    #[test]
    fn test_create_runs_factory() {
        let mut catalog = PluginCatalog::new();
        catalog.register_output(&MARKER, make_marker);

        let entry = catalog.lookup(PluginRole::Output, "marker").unwrap();
        let mut context = PluginContext::default();
        let instance = entry.create(&PluginParams::new("Marker"), &mut context).unwrap();
        assert_eq!(instance.kind(), "support");
    }

    #[test]
    fn test_list_sorted_by_id() {
        const B: PluginDescriptor = PluginDescriptor::new("b", "B");
        const A: PluginDescriptor = PluginDescriptor::new("a", "A");
        let mut catalog = PluginCatalog::new();
        catalog.register_sensor(&B, make_marker);
        catalog.register_sensor(&A, make_marker);

        let ids: Vec<_> = catalog.list(PluginRole::Sensor).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(catalog.list(PluginRole::Notification).is_empty());
    }
}
