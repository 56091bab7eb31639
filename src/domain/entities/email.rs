use serde::{Deserialize, Serialize};

/// Rendered email ready for a mail transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub template: String,
    pub from: String,
    pub to: Vec<String>,
    pub body: String,
    pub context: serde_json::Value,
}
