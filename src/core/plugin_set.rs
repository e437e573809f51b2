//! The instantiated plugins of a run

use crate::error::StartupError;
use airpi_core::{Notification, Output, PluginDescriptor, PluginInstance, PluginRole, Sensor};

/// A plugin together with the name of the config section it came from
pub struct LoadedPlugin<T: ?Sized> {
    pub name: String,
    /// Recorded from the section's `async` flag; dispatch is sequential
    pub is_async: bool,
    pub plugin: Box<T>,
}

/// Plugins ready for the sample loop, in configuration order
#[derive(Default)]
pub struct PluginSet {
    sensors: Vec<LoadedPlugin<dyn Sensor>>,
    outputs: Vec<LoadedPlugin<dyn Output>>,
    notifications: Vec<LoadedPlugin<dyn Notification>>,
    /// Plugins kept alive for what they provide, never dispatched to
    support: Vec<(String, PluginInstance)>,
    /// Index into `sensors` of the location source
    gps: Option<usize>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(&self, role: PluginRole, name: &str) -> Result<(), StartupError> {
        let taken = match role {
            PluginRole::Sensor => self.sensors.iter().any(|p| p.name == name),
            PluginRole::Output => self.outputs.iter().any(|p| p.name == name),
            PluginRole::Notification => self.notifications.iter().any(|p| p.name == name),
        } || self.support.iter().any(|(n, _)| n == name);
        if taken {
            return Err(StartupError::DuplicatePlugin {
                role,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Add a freshly built plugin loaded from a `role` section.
    ///
    /// Instances that do not provide the role's capability are kept as
    /// support plugins.
    pub fn add(
        &mut self,
        role: PluginRole,
        name: &str,
        descriptor: &PluginDescriptor,
        is_async: bool,
        instance: PluginInstance,
    ) -> Result<(), StartupError> {
        self.check_unique(role, name)?;
        let name = name.to_string();

        match (role, instance) {
            (PluginRole::Sensor, PluginInstance::Sensor(plugin)) => {
                if descriptor.reports_location {
                    if let Some(previous) = self.gps {
                        log::warn!(
                            "Both {} and {} report a location; using {}",
                            self.sensors[previous].name,
                            name,
                            name
                        );
                    }
                    self.gps = Some(self.sensors.len());
                }
                self.sensors.push(LoadedPlugin { name, is_async, plugin });
            }
            (PluginRole::Output, PluginInstance::Output(plugin)) => {
                self.outputs.push(LoadedPlugin { name, is_async, plugin });
            }
            (PluginRole::Notification, PluginInstance::Notification(plugin)) => {
                self.notifications.push(LoadedPlugin { name, is_async, plugin });
            }
            (_, instance) => {
                log::info!("Loaded support plugin {} ({})", name, instance.kind());
                self.support.push((name, instance));
            }
        }
        Ok(())
    }

    pub fn sensors(&self) -> &[LoadedPlugin<dyn Sensor>] {
        &self.sensors
    }

    pub fn outputs(&self) -> &[LoadedPlugin<dyn Output>] {
        &self.outputs
    }

    pub fn notifications(&self) -> &[LoadedPlugin<dyn Notification>] {
        &self.notifications
    }

    pub fn sensors_mut(&mut self) -> &mut [LoadedPlugin<dyn Sensor>] {
        &mut self.sensors
    }

    pub fn outputs_mut(&mut self) -> &mut [LoadedPlugin<dyn Output>] {
        &mut self.outputs
    }

    pub fn notifications_mut(&mut self) -> &mut [LoadedPlugin<dyn Notification>] {
        &mut self.notifications
    }

    pub fn support_names(&self) -> impl Iterator<Item = &str> {
        self.support.iter().map(|(name, _)| name.as_str())
    }

    /// The support plugin loaded from section `name`
    pub fn support(&self, name: &str) -> Option<&PluginInstance> {
        self.support.iter().find(|(n, _)| n == name).map(|(_, instance)| instance)
    }

    /// Index of the location-reporting sensor
    pub fn gps_index(&self) -> Option<usize> {
        self.gps
    }

    /// Call every sensor's stop hook
    pub fn stop_sensors(&mut self) {
        for sensor in &mut self.sensors {
            log::debug!("Stopping sensor {}", sensor.name);
            sensor.plugin.stop();
        }
    }
}
