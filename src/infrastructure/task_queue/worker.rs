use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, error, warn};

use crate::application::errors::Result;
use crate::application::tasks::JobRunner;
use crate::domain::entities::scheduled_job::ScheduledJob;
use crate::domain::repositories::task_queue::TaskQueue;

const IDLE_SLEEP: Duration = Duration::from_secs(300);
const RETRY_DELAY_MINUTES: i64 = 1;

/// Background worker draining the task queue in eta order
pub struct TaskWorker;

impl TaskWorker {
    pub fn start(queue: Arc<dyn TaskQueue>, runner: Arc<JobRunner>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut wakeup_receiver = queue.subscribe_wakeup();

            loop {
                match Self::iteration(&queue, &runner, &mut wakeup_receiver).await {
                    Ok(true) => {}
                    Ok(false) => {
                        // queue empty
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP) => {},
                            _ = wakeup_receiver.recv() => {}
                        }
                    }
                    Err(e) => {
                        error!("Worker iteration error: {}", e);
                        sleep(Duration::from_secs(60)).await;
                    }
                }
            }
        })
    }

    /// Returns false when there is nothing queued
    async fn iteration(
        queue: &Arc<dyn TaskQueue>,
        runner: &JobRunner,
        wakeup_receiver: &mut broadcast::Receiver<()>,
    ) -> Result<bool> {
        let now = Utc::now();

        let Some(next) = queue.peek_next().await? else {
            return Ok(false);
        };

        if next.is_due(now) {
            if let Some(job) = queue.pop_next().await? {
                Self::process_due_job(queue, runner, job).await?;
            }
            return Ok(true);
        }

        let time_until_job = (next.eta - now)
            .to_std()
            .unwrap_or(Duration::from_secs(1));
        tokio::select! {
            _ = sleep(time_until_job) => {}
            _ = wakeup_receiver.recv() => {}
        }
        Ok(true)
    }

    async fn process_due_job(
        queue: &Arc<dyn TaskQueue>,
        runner: &JobRunner,
        scheduled: ScheduledJob,
    ) -> Result<()> {
        debug!("Running task {} ({})", scheduled.task_id, scheduled.job.name());

        if let Err(e) = runner.run(&scheduled.task_id, &scheduled.job).await {
            warn!(
                "Task {} ({}) failed, retrying in {} minute(s): {}",
                scheduled.task_id,
                scheduled.job.name(),
                RETRY_DELAY_MINUTES,
                e
            );
            let mut retry = scheduled;
            retry.eta = Utc::now() + chrono::Duration::minutes(RETRY_DELAY_MINUTES);
            queue.push(retry).await?;
        }
        Ok(())
    }

    /// Run every job already due, then return. Catches up on reminders missed while stopped.
    pub async fn drain_due(queue: &Arc<dyn TaskQueue>, runner: &JobRunner) -> Result<usize> {
        let mut ran = 0;
        while let Some(next) = queue.peek_next().await? {
            if !next.is_due(Utc::now()) {
                break;
            }
            let Some(job) = queue.pop_next().await? else {
                break;
            };
            Self::process_due_job(queue, runner, job).await?;
            ran += 1;
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::TestApp;
    use crate::domain::entities::scheduled_job::{Job, ReminderKind};

    #[tokio::test]
    async fn drains_due_jobs_only() {
        let app = TestApp::new().await;
        let now = Utc::now();
        let poll = app
            .create_poll("Swag", now + chrono::Duration::hours(1), now + chrono::Duration::days(1))
            .await;
        app.outbox.clear().await;

        // bring the scheduled start reminder forward
        app.queue
            .push(ScheduledJob::new(
                poll.task_start_id.clone().unwrap(),
                now - chrono::Duration::minutes(1),
                Job::VotingReminder {
                    poll_id: poll.id,
                    kind: ReminderKind::Start,
                },
            ))
            .await
            .unwrap();

        let queue: Arc<dyn TaskQueue> = app.queue.clone();
        let ran = TaskWorker::drain_due(&queue, &app.runner).await.unwrap();
        assert_eq!(ran, 1);
        // start reminder for the two-member group; the end reminder stays queued
        assert_eq!(app.outbox.messages().await.len(), 2);
        let pending = app.queue.pending_jobs().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].task_id, poll.task_end_id.unwrap());
    }
}
