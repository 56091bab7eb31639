use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::entities::scheduled_job::ScheduledJob;

#[derive(Debug)]
pub enum QueueError {
    StorageError(String),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            QueueError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for QueueError {}

/// Background job queue with celery-like revocation
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Add a job to the queue, replacing any job with the same task id
    async fn push(&self, job: ScheduledJob) -> Result<(), QueueError>;

    /// Get the next live job (without removing it)
    async fn peek_next(&self) -> Result<Option<ScheduledJob>, QueueError>;

    /// Remove and return the next live job
    async fn pop_next(&self) -> Result<Option<ScheduledJob>, QueueError>;

    /// Cancel a job by task id. Unknown ids are not an error.
    async fn revoke(&self, task_id: &str) -> Result<(), QueueError>;

    async fn has_pending(&self) -> Result<bool, QueueError>;

    /// Receiver woken whenever a job is pushed
    fn subscribe_wakeup(&self) -> broadcast::Receiver<()>;
}
