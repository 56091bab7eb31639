use async_trait::async_trait;

use crate::domain::entities::choices::{RadioPoll, RadioPollChoice, RangePoll, RangePollChoice};
use crate::domain::entities::poll::{NewPoll, Poll};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait PollRepository: Send + Sync {
    async fn insert(&self, poll: &NewPoll) -> Result<Poll>;

    /// Persist every field except the scheduled task ids
    async fn update(&self, poll: &Poll) -> Result<()>;

    async fn get(&self, poll_id: i64) -> Result<Option<Poll>>;

    async fn list(&self) -> Result<Vec<Poll>>;

    /// Delete the poll together with its choice sets, comments and votes
    async fn delete(&self, poll_id: i64) -> Result<()>;

    async fn find_by_bug(&self, bug_pk: i64) -> Result<Option<Poll>>;

    /// Store task ids without going through the save hooks
    async fn set_task_ids(
        &self,
        poll_id: i64,
        task_start_id: Option<String>,
        task_end_id: Option<String>,
    ) -> Result<()>;

    async fn set_extended(&self, poll_id: i64, end: chrono::DateTime<chrono::Utc>) -> Result<()>;

    async fn add_range_poll(&self, poll_id: i64, name: &str) -> Result<RangePoll>;

    async fn add_range_choice(&self, range_poll_id: i64, nominee_id: i64) -> Result<RangePollChoice>;

    async fn range_polls(&self, poll_id: i64) -> Result<Vec<RangePoll>>;

    async fn list_range_polls(&self) -> Result<Vec<RangePoll>>;

    async fn add_radio_poll(&self, poll_id: i64, question: &str) -> Result<RadioPoll>;

    async fn add_radio_choice(&self, radio_poll_id: i64, answer: &str) -> Result<RadioPollChoice>;

    async fn radio_polls(&self, poll_id: i64) -> Result<Vec<RadioPoll>>;

    async fn list_radio_polls(&self) -> Result<Vec<RadioPoll>>;
}
