//! airpi-notifications: Alert notification plugins.

pub mod console;
pub mod messages;
pub mod webhook;

use airpi_core::PluginCatalog;

pub fn register_all(catalog: &mut PluginCatalog) {
    catalog.register_notification(&console::DESCRIPTOR, console::create);
    catalog.register_notification(&webhook::DESCRIPTOR, webhook::create);
}

#[cfg(test)]
mod tests {
    use super::*;
    use airpi_core::PluginRole;

    #[test]
    fn test_register_all() {
        let mut catalog = PluginCatalog::new();
        register_all(&mut catalog);
        assert_eq!(catalog.list(PluginRole::Notification).len(), 2);
        assert!(catalog
            .lookup(PluginRole::Notification, "console")
            .unwrap()
            .descriptor
            .declares("msgAlertSensor"));
    }
}
