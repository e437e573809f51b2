//! Plugin roles

use std::fmt;

/// The three configuration groups a plugin can be declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginRole {
    Sensor,
    Output,
    Notification,
}

impl PluginRole {
    pub const ALL: [PluginRole; 3] = [
        PluginRole::Sensor,
        PluginRole::Output,
        PluginRole::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginRole::Sensor => "sensor",
            PluginRole::Output => "output",
            PluginRole::Notification => "notification",
        }
    }
}

impl fmt::Display for PluginRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
