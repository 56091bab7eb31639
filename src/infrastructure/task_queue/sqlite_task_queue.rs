//! Durable task queue stored in the `scheduled_jobs` table (see schema.sql).
//! Job payloads are serialized as JSON.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row, params};
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::entities::scheduled_job::{Job, ScheduledJob};
use crate::domain::repositories::task_queue::{QueueError, TaskQueue};
use crate::infrastructure::database::connection::DatabaseManager;
use crate::infrastructure::repositories::timestamps::{from_db, to_db};

const NEXT_JOB_QUERY: &str =
    "SELECT task_id, eta, payload FROM scheduled_jobs ORDER BY eta ASC, task_id ASC LIMIT 1";

#[derive(Debug, Clone)]
pub struct SqliteTaskQueue {
    db: DatabaseManager,
    wakeup_sender: broadcast::Sender<()>,
}

impl SqliteTaskQueue {
    /// Expects the schema to be initialized already.
    pub fn new(db: DatabaseManager) -> Self {
        let (wakeup_sender, _) = broadcast::channel(16);
        Self { db, wakeup_sender }
    }

    fn row_to_job(row: &Row) -> rusqlite::Result<ScheduledJob> {
        let payload: String = row.get(2)?;
        let job: Job = serde_json::from_str(&payload).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(ScheduledJob::new(row.get(0)?, from_db(row.get(1)?)?, job))
    }
}

fn storage_error(e: anyhow::Error) -> QueueError {
    QueueError::StorageError(format!("{:#}", e))
}

#[async_trait]
impl TaskQueue for SqliteTaskQueue {
    async fn push(&self, job: ScheduledJob) -> Result<(), QueueError> {
        let payload = serde_json::to_string(&job.job)
            .map_err(|e| QueueError::StorageError(format!("Failed to encode job: {}", e)))?;

        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO scheduled_jobs (task_id, eta, payload)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(task_id) DO UPDATE SET
                        eta = excluded.eta,
                        payload = excluded.payload
                    "#,
                    params![job.task_id, to_db(job.eta), payload],
                )
            })
            .await
            .map_err(storage_error)?;

        let _ = self.wakeup_sender.send(());
        Ok(())
    }

    async fn peek_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.db
            .execute_blocking(|conn| {
                conn.query_row(NEXT_JOB_QUERY, [], Self::row_to_job)
                    .optional()
            })
            .await
            .map_err(storage_error)
    }

    async fn pop_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.db
            .execute_blocking(|conn| {
                let tx = conn.unchecked_transaction()?;
                let job = tx
                    .query_row(NEXT_JOB_QUERY, [], Self::row_to_job)
                    .optional()?;
                if let Some(job) = &job {
                    tx.execute(
                        "DELETE FROM scheduled_jobs WHERE task_id = ?1",
                        params![job.task_id],
                    )?;
                }
                tx.commit()?;
                Ok(job)
            })
            .await
            .map_err(storage_error)
    }

    async fn revoke(&self, task_id: &str) -> Result<(), QueueError> {
        let id = task_id.to_string();
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "DELETE FROM scheduled_jobs WHERE task_id = ?1",
                    params![id],
                )
            })
            .await
            .map_err(storage_error)?;

        if affected == 0 {
            debug!("Revoked task {} was not queued", task_id);
        }
        Ok(())
    }

    async fn has_pending(&self) -> Result<bool, QueueError> {
        self.db
            .execute_blocking(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM scheduled_jobs)",
                    [],
                    |row| row.get::<_, bool>(0),
                )
            })
            .await
            .map_err(storage_error)
    }

    fn subscribe_wakeup(&self) -> broadcast::Receiver<()> {
        self.wakeup_sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::email::EmailMessage;
    use crate::domain::entities::scheduled_job::ReminderKind;
    use chrono::{Duration, Utc};

    async fn queue() -> SqliteTaskQueue {
        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();
        SqliteTaskQueue::new(db)
    }

    async fn stored_rows(queue: &SqliteTaskQueue) -> i64 {
        queue
            .db
            .execute_blocking(|conn| {
                conn.query_row("SELECT COUNT(*) FROM scheduled_jobs", [], |row| row.get(0))
            })
            .await
            .unwrap()
    }

    fn end_reminder(task_id: String) -> ScheduledJob {
        ScheduledJob::new(
            task_id,
            Utc::now() + Duration::days(1),
            Job::VotingReminder {
                poll_id: 1,
                kind: ReminderKind::End,
            },
        )
    }

    #[tokio::test]
    async fn payload_survives_storage() {
        let queue = queue().await;
        let message = EmailMessage {
            subject: "[Voting] Results".to_string(),
            template: "emails/voting_results_reminder.txt".to_string(),
            from: "noreply@example.org".to_string(),
            to: vec!["Jane Doe <jane@example.org>".to_string()],
            body: "body".to_string(),
            context: serde_json::json!({ "poll": "poll" }),
        };
        let eta = Utc::now();
        queue
            .push(ScheduledJob::new("mail-1".to_string(), eta, Job::SendMail(message.clone())))
            .await
            .unwrap();

        let popped = queue.pop_next().await.unwrap().unwrap();
        assert_eq!(popped.task_id, "mail-1");
        assert_eq!(popped.eta.timestamp(), eta.timestamp());
        assert_eq!(popped.job, Job::SendMail(message));
        assert!(queue.pop_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoked_jobs_are_skipped() {
        let queue = queue().await;
        let now = Utc::now();
        for (id, hours) in [("start", 1), ("end", 5)] {
            queue
                .push(ScheduledJob::new(
                    id.to_string(),
                    now + Duration::hours(hours),
                    Job::VotingReminder {
                        poll_id: 1,
                        kind: ReminderKind::Start,
                    },
                ))
                .await
                .unwrap();
        }

        queue.revoke("start").await.unwrap();
        queue.revoke("never-queued").await.unwrap();

        assert_eq!(queue.peek_next().await.unwrap().unwrap().task_id, "end");
        queue.revoke("end").await.unwrap();
        assert!(!queue.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn revoke_removes_rows() {
        let queue = queue().await;
        for i in 0..50 {
            let task_id = format!("edit-{}", i);
            queue.push(end_reminder(task_id.clone())).await.unwrap();
            queue.revoke(&task_id).await.unwrap();
        }
        assert_eq!(stored_rows(&queue).await, 0);

        queue.push(end_reminder("kept".to_string())).await.unwrap();
        queue.push(end_reminder("kept".to_string())).await.unwrap();
        assert_eq!(stored_rows(&queue).await, 1);
    }
}
