use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollComment {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub created_on: DateTime<Utc>,
    pub comment: String,
}
