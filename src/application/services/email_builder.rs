use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::application::templates;
use crate::domain::entities::email::EmailMessage;
use crate::domain::entities::poll::Poll;
use crate::infrastructure::config::Settings;

/// Turns (subject, template, recipients, context) into one message per distinct recipient
#[derive(Debug, Clone)]
pub struct EmailBuilder {
    settings: Arc<Settings>,
}

impl EmailBuilder {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn build(
        &self,
        subject: &str,
        template: &str,
        recipients: &[String],
        context: &Value,
    ) -> Vec<EmailMessage> {
        let body = templates::render(template, context);
        let mut seen: Vec<&str> = Vec::new();
        let mut messages = Vec::new();

        for recipient in recipients {
            let recipient = recipient.trim();
            if recipient.is_empty() || seen.contains(&recipient) {
                continue;
            }
            seen.push(recipient);
            messages.push(EmailMessage {
                subject: subject.to_string(),
                template: template.to_string(),
                from: self.settings.from_email.clone(),
                to: vec![recipient.to_string()],
                body: body.clone(),
                context: context.clone(),
            });
        }
        messages
    }

    /// Poll context with window dates in the configured time zone
    pub fn poll_context(&self, poll: &Poll) -> Value {
        json!({
            "poll": poll,
            "SITE_URL": self.settings.site_url,
            "start": self.local_time(poll.start),
            "end": self.local_time(poll.end),
        })
    }

    pub fn local_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.settings.time_zone)
            .format("%A, %d %B %Y at %H:%M %Z")
            .to_string()
    }
}
