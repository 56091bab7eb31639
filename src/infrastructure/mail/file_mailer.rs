use async_trait::async_trait;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::entities::email::EmailMessage;
use crate::domain::repositories::mailer::{MailError, Mailer};

/// Stores each message as a JSON document in a directory
#[derive(Debug, Clone)]
pub struct FileMailer {
    directory: PathBuf,
}

impl FileMailer {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let json = serde_json::to_string_pretty(message)
            .map_err(|e| MailError::Transport(format!("Failed to encode email: {}", e)))?;
        let file_name = format!(
            "{}-{}.json",
            Utc::now().format("%Y%m%d-%H%M%S"),
            uuid::Uuid::new_v4()
        );
        let directory = self.directory.clone();

        let path = tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
            fs::create_dir_all(&directory)?;
            let path = directory.join(file_name);
            fs::write(&path, json)?;
            Ok(path)
        })
        .await
        .map_err(|e| MailError::Transport(format!("Join error: {}", e)))?
        .map_err(|e| MailError::Transport(format!("Failed to write email: {}", e)))?;

        debug!("Email '{}' written to {}", message.subject, path.display());
        Ok(())
    }
}
