use async_trait::async_trait;
use tracing::info;

use crate::domain::entities::email::EmailMessage;
use crate::domain::repositories::mailer::{MailError, Mailer};

/// Writes every message to the log instead of delivering it
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        info!(
            from = %message.from,
            to = %message.to.join(", "),
            template = %message.template,
            "Email: {}\n{}",
            message.subject,
            message.body
        );
        Ok(())
    }
}
