use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::poll_comment::PollComment;
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(
        &self,
        poll_id: i64,
        user_id: i64,
        comment: &str,
        created_on: DateTime<Utc>,
    ) -> Result<PollComment>;

    /// Comments of a poll, oldest first
    async fn list_for_poll(&self, poll_id: i64) -> Result<Vec<PollComment>>;
}
