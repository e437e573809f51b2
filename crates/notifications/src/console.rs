//! Console notification: logs the alert and prints it to stderr

use crate::messages::{AlertMessages, COMMON_PARAMS};
use airpi_core::{Notification, NotificationEvent, PluginContext, PluginDescriptor, PluginInstance, PluginParams};
use anyhow::Result;
use std::io::Write;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("console", "Console")
    .description("Report alerts on the terminal and in the log")
    .common(COMMON_PARAMS);

pub struct ConsoleNotification<W: Write + Send> {
    messages: AlertMessages,
    out: W,
}

impl<W: Write + Send> Notification for ConsoleNotification<W> {
    fn send_notification(&mut self, event: NotificationEvent) -> Result<()> {
        let text = self.messages.text(event);
        log::warn!("{}", text);
        writeln!(self.out, "{}", text)?;
        Ok(())
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    Ok(PluginInstance::Notification(Box::new(ConsoleNotification {
        messages: AlertMessages::from_params(params, context),
        out: std::io::stderr(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_one_line_per_event() {
        let context = PluginContext::default();
        let params = PluginParams::new("Console").with("msgalertsensor", "sensor trouble");
        let mut console = ConsoleNotification {
            messages: AlertMessages::from_params(&params, &context),
            out: Vec::new(),
        };

        console.send_notification(NotificationEvent::AlertSensor).unwrap();
        console.send_notification(NotificationEvent::AlertSensor).unwrap();
        assert_eq!(String::from_utf8(console.out).unwrap(), "sensor trouble\nsensor trouble\n");
    }
}
