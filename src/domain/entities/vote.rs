use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub poll_id: i64,
    pub date_voted: DateTime<Utc>,
}

/// Vote joined with the names shown in listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteDetail {
    pub vote: Vote,
    pub user_first_name: String,
    pub user_last_name: String,
    pub poll_name: String,
}

/// Ballot content handed to the repository together with the vote row
#[derive(Debug, Clone)]
pub enum Ballot {
    Radio { choice_id: i64 },
    Range { scores: Vec<(i64, i64)> },
}
