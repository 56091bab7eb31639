use async_trait::async_trait;

use crate::domain::entities::email::EmailMessage;

#[derive(Debug)]
pub enum MailError {
    NoRecipients,
    Transport(String),
}

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MailError::NoRecipients => write!(f, "Email has no recipients"),
            MailError::Transport(msg) => write!(f, "Mail transport error: {}", msg),
        }
    }
}

impl std::error::Error for MailError {}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
