use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::application::errors::Result;
use crate::application::tasks::runner::JobRunner;
use crate::domain::entities::scheduled_job::{Job, ScheduledJob};
use crate::domain::repositories::task_queue::TaskQueue;

/// Front door to the task queue: enqueue now, enqueue at an eta, revoke
pub struct TaskDispatcher {
    queue: Arc<dyn TaskQueue>,
    runner: Arc<JobRunner>,
    always_eager: bool,
}

impl TaskDispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>, runner: Arc<JobRunner>, always_eager: bool) -> Self {
        Self {
            queue,
            runner,
            always_eager,
        }
    }

    /// Run `job` as soon as possible. In eager mode it runs inline; failures are
    /// logged, never returned to the caller.
    pub async fn delay(&self, job: Job) -> Result<String> {
        let task_id = new_task_id();
        if self.always_eager {
            if let Err(e) = self.runner.run(&task_id, &job).await {
                error!("Eager task {} ({}) failed: {}", task_id, job.name(), e);
            }
            return Ok(task_id);
        }

        self.queue
            .push(ScheduledJob::new(task_id.clone(), Utc::now(), job))
            .await?;
        Ok(task_id)
    }

    /// Queue `job` for execution at `eta`
    pub async fn apply_async(&self, job: Job, eta: DateTime<Utc>) -> Result<String> {
        let task_id = new_task_id();
        debug!("Scheduling task {} ({}) at {}", task_id, job.name(), eta);
        self.queue
            .push(ScheduledJob::new(task_id.clone(), eta, job))
            .await?;
        Ok(task_id)
    }

    /// Best-effort cancellation; returns whether the queue accepted the request
    pub async fn revoke(&self, task_id: &str) -> bool {
        match self.queue.revoke(task_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to revoke task {}: {}", task_id, e);
                false
            }
        }
    }
}

fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::TestApp;
    use crate::domain::entities::email::EmailMessage;
    use crate::infrastructure::task_queue::MemoryTaskQueue;
    use chrono::Duration;

    fn mail() -> Job {
        Job::SendMail(EmailMessage {
            subject: "Hello".into(),
            template: "emails/voting_new_poll.txt".into(),
            from: "from@example.com".into(),
            to: vec!["to@example.com".into()],
            body: String::new(),
            context: serde_json::Value::Null,
        })
    }

    #[tokio::test]
    async fn eager_delay_runs_inline() {
        let app = TestApp::new().await;
        app.dispatcher.delay(mail()).await.unwrap();
        assert_eq!(app.outbox.messages().await.len(), 1);
        assert!(app.queue.pending_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn lazy_delay_queues_job() {
        let app = TestApp::new().await;
        let queue = Arc::new(MemoryTaskQueue::new());
        let dispatcher = TaskDispatcher::new(queue.clone(), app.runner.clone(), false);

        let task_id = dispatcher.delay(mail()).await.unwrap();
        let eta = Utc::now() + Duration::hours(1);
        let later = dispatcher.apply_async(mail(), eta).await.unwrap();

        assert!(app.outbox.messages().await.is_empty());
        let pending = queue.pending_jobs().await;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].task_id, task_id);
        assert_eq!(pending[1].task_id, later);
        assert_ne!(task_id, later);
    }

    #[tokio::test]
    async fn revoke_reports_queue_failures() {
        let app = TestApp::with_failing_revoke().await;
        assert!(!app.dispatcher.revoke("anything").await);

        let app = TestApp::new().await;
        assert!(app.dispatcher.revoke("anything").await);
    }
}
