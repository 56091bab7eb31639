use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::vote::{Ballot, Vote, VoteDetail};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Store the vote and add the ballot to the choice counters atomically.
    /// A second vote by the same user on the same poll is `AlreadyExists`.
    async fn record(
        &self,
        poll_id: i64,
        user_id: i64,
        date_voted: DateTime<Utc>,
        ballot: &Ballot,
    ) -> Result<Vote>;

    async fn has_voted(&self, poll_id: i64, user_id: i64) -> Result<bool>;

    async fn count_for_poll(&self, poll_id: i64) -> Result<i64>;

    async fn list_for_poll(&self, poll_id: i64) -> Result<Vec<Vote>>;

    async fn list_detailed(&self) -> Result<Vec<VoteDetail>>;
}
