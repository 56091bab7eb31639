use async_trait::async_trait;
use std::collections::BinaryHeap;
use tokio::sync::{Mutex, broadcast};

use crate::domain::entities::scheduled_job::ScheduledJob;
use crate::domain::repositories::task_queue::{QueueError, TaskQueue};

/// In-memory task queue backed by a priority queue
#[derive(Debug)]
pub struct MemoryTaskQueue {
    jobs: Mutex<BinaryHeap<ScheduledJob>>,
    // every revoke request in call order, including ids that were never queued
    revoked: Mutex<Vec<String>>,
    wakeup_sender: broadcast::Sender<()>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        let (wakeup_sender, _) = broadcast::channel(16);
        Self {
            jobs: Mutex::new(BinaryHeap::new()),
            revoked: Mutex::new(Vec::new()),
            wakeup_sender,
        }
    }

    pub async fn revoked_ids(&self) -> Vec<String> {
        self.revoked.lock().await.clone()
    }

    pub async fn pending_jobs(&self) -> Vec<ScheduledJob> {
        let mut jobs = self.jobs.lock().await.clone().into_sorted_vec();
        jobs.reverse();
        jobs
    }
}

impl Default for MemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn push(&self, job: ScheduledJob) -> Result<(), QueueError> {
        {
            let mut jobs = self.jobs.lock().await;
            jobs.retain(|queued| queued.task_id != job.task_id);
            jobs.push(job);
        }
        let _ = self.wakeup_sender.send(());
        Ok(())
    }

    async fn peek_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.peek().cloned())
    }

    async fn pop_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        let mut jobs = self.jobs.lock().await;
        Ok(jobs.pop())
    }

    async fn revoke(&self, task_id: &str) -> Result<(), QueueError> {
        self.revoked.lock().await.push(task_id.to_string());
        self.jobs.lock().await.retain(|job| job.task_id != task_id);
        Ok(())
    }

    async fn has_pending(&self) -> Result<bool, QueueError> {
        Ok(!self.jobs.lock().await.is_empty())
    }

    fn subscribe_wakeup(&self) -> broadcast::Receiver<()> {
        self.wakeup_sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::scheduled_job::{Job, ReminderKind};
    use chrono::{Duration, Utc};

    fn reminder(task_id: &str, hours: i64) -> ScheduledJob {
        ScheduledJob::new(
            task_id.to_string(),
            Utc::now() + Duration::hours(hours),
            Job::VotingReminder {
                poll_id: 7,
                kind: ReminderKind::End,
            },
        )
    }

    #[tokio::test]
    async fn pops_in_eta_order() {
        let queue = MemoryTaskQueue::new();
        queue.push(reminder("b", 2)).await.unwrap();
        queue.push(reminder("a", 1)).await.unwrap();

        assert_eq!(queue.peek_next().await.unwrap().unwrap().task_id, "a");
        assert_eq!(queue.pop_next().await.unwrap().unwrap().task_id, "a");
        assert_eq!(queue.pop_next().await.unwrap().unwrap().task_id, "b");
        assert!(!queue.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn revoke_drops_job_and_records_call() {
        let queue = MemoryTaskQueue::new();
        queue.push(reminder("a", 1)).await.unwrap();
        queue.revoke("a").await.unwrap();
        queue.revoke("unknown").await.unwrap();

        assert!(!queue.has_pending().await.unwrap());
        assert_eq!(queue.revoked_ids().await, vec!["a", "unknown"]);
    }

    #[tokio::test]
    async fn push_wakes_subscribers() {
        let queue = MemoryTaskQueue::new();
        let mut wakeup = queue.subscribe_wakeup();
        queue.push(reminder("a", 1)).await.unwrap();
        assert!(wakeup.try_recv().is_ok());
    }
}
