//! Webhook notification
//!
//! POSTs `{"text": ..., "host": ..., "event": ...}` to a URL, which is
//! the shape Slack-style incoming webhooks accept.

use crate::messages::{AlertMessages, COMMON_PARAMS};
use airpi_core::{Notification, NotificationEvent, PluginContext, PluginDescriptor, PluginInstance, PluginParams};
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("webhook", "Webhook")
    .description("Post alerts to an HTTP webhook")
    .required(&["url"])
    .common(COMMON_PARAMS)
    .needs_internet();

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookNotification {
    url: String,
    agent: ureq::Agent,
    messages: AlertMessages,
}

impl WebhookNotification {
    fn body(&self, event: NotificationEvent) -> serde_json::Value {
        json!({
            "text": self.messages.text(event),
            "host": self.messages.hostname(),
            "event": event.tag(),
        })
    }
}

impl Notification for WebhookNotification {
    fn send_notification(&mut self, event: NotificationEvent) -> Result<()> {
        self.agent
            .post(&self.url)
            .send_json(self.body(event))
            .with_context(|| format!("Webhook {} failed", self.url))?;
        log::info!("Sent {} to webhook", event);
        Ok(())
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let url = params.require("url")?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!(params.invalid("url", url, "expected an http:// or https:// URL"));
    }
    Ok(PluginInstance::Notification(Box::new(WebhookNotification {
        url: url.to_string(),
        agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        messages: AlertMessages::from_params(params, context),
    })))
}
