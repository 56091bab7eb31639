use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

use crate::domain::entities::email::EmailMessage;
use crate::domain::entities::poll::{NewPoll, Poll};
use crate::domain::entities::scheduled_job::{Job, ScheduledJob};
use crate::domain::entities::user::{Group, NewUser, User};
use crate::domain::repositories::mailer::{MailError, Mailer};
use crate::domain::repositories::task_queue::{QueueError, TaskQueue};
use crate::infrastructure::bootstrap::AppContext;
use crate::infrastructure::config::Settings;
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::task_queue::MemoryTaskQueue;

pub const COUNCIL_ALIAS: &str = "reps-council@example.com";

/// Mailer that keeps every message
#[derive(Default)]
pub struct OutboxMailer {
    messages: Mutex<Vec<EmailMessage>>,
}

impl OutboxMailer {
    pub async fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.messages.lock().await.clear();
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        self.messages.lock().await.push(message.clone());
        Ok(())
    }
}

/// Memory queue whose revoke always fails
pub struct FailingRevokeQueue {
    inner: Arc<MemoryTaskQueue>,
}

#[async_trait]
impl TaskQueue for FailingRevokeQueue {
    async fn push(&self, job: ScheduledJob) -> Result<(), QueueError> {
        self.inner.push(job).await
    }

    async fn peek_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.inner.peek_next().await
    }

    async fn pop_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.inner.pop_next().await
    }

    async fn revoke(&self, _task_id: &str) -> Result<(), QueueError> {
        Err(QueueError::StorageError("broker unreachable".to_string()))
    }

    async fn has_pending(&self) -> Result<bool, QueueError> {
        self.inner.has_pending().await
    }

    fn subscribe_wakeup(&self) -> broadcast::Receiver<()> {
        self.inner.subscribe_wakeup()
    }
}

/// Memory queue that refuses mail jobs, so only reminders get queued
pub struct MailRejectingQueue {
    inner: Arc<MemoryTaskQueue>,
}

#[async_trait]
impl TaskQueue for MailRejectingQueue {
    async fn push(&self, job: ScheduledJob) -> Result<(), QueueError> {
        if let Job::SendMail(_) = job.job {
            return Err(QueueError::StorageError("broker unreachable".to_string()));
        }
        self.inner.push(job).await
    }

    async fn peek_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.inner.peek_next().await
    }

    async fn pop_next(&self) -> Result<Option<ScheduledJob>, QueueError> {
        self.inner.pop_next().await
    }

    async fn revoke(&self, task_id: &str) -> Result<(), QueueError> {
        self.inner.revoke(task_id).await
    }

    async fn has_pending(&self) -> Result<bool, QueueError> {
        self.inner.has_pending().await
    }

    fn subscribe_wakeup(&self) -> broadcast::Receiver<()> {
        self.inner.subscribe_wakeup()
    }
}

#[derive(Clone, Copy)]
enum QueueFault {
    None,
    Revoke,
    MailPush,
}

/// Fully wired app on an in-memory database with eager mail delivery.
///
/// Fixture: group "Admin" with `admin` and `member`, group "Council" with two
/// councillors, and the `remobot` user in no group.
pub struct TestApp {
    ctx: AppContext,
    pub queue: Arc<MemoryTaskQueue>,
    pub outbox: Arc<OutboxMailer>,
    pub admin: User,
    pub member: User,
    pub bot: User,
    pub councillors: Vec<User>,
    pub admin_group: Group,
    pub council: Group,
}

impl Deref for TestApp {
    type Target = AppContext;

    fn deref(&self) -> &AppContext {
        &self.ctx
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(QueueFault::None).await
    }

    pub async fn with_failing_revoke() -> Self {
        Self::build(QueueFault::Revoke).await
    }

    /// Queued (non-eager) delivery against a queue that rejects mail jobs
    pub async fn with_unqueueable_mail() -> Self {
        Self::build(QueueFault::MailPush).await
    }

    async fn build(fault: QueueFault) -> Self {
        let settings = Settings {
            task_always_eager: !matches!(fault, QueueFault::MailPush),
            council_alias: COUNCIL_ALIAS.to_string(),
            from_email: "reps-noreply@example.com".to_string(),
            ..Settings::default()
        };

        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();

        let queue = Arc::new(MemoryTaskQueue::new());
        let task_queue: Arc<dyn TaskQueue> = match fault {
            QueueFault::None => queue.clone() as Arc<dyn TaskQueue>,
            QueueFault::Revoke => Arc::new(FailingRevokeQueue {
                inner: queue.clone(),
            }),
            QueueFault::MailPush => Arc::new(MailRejectingQueue {
                inner: queue.clone(),
            }),
        };
        let outbox = Arc::new(OutboxMailer::default());
        let ctx = AppContext::build(Arc::new(settings), db, task_queue, outbox.clone());

        let admin = ctx
            .users
            .create_user(&new_user("admin", "Alex", "Smith", &["Admin"]))
            .await
            .unwrap();
        let member = ctx
            .users
            .create_user(&new_user("mary", "Mary", "Anderson", &["Admin"]))
            .await
            .unwrap();
        let bot = ctx
            .users
            .create_user(&new_user("remobot", "Remo", "Bot", &[]))
            .await
            .unwrap();
        let mut councillors = Vec::new();
        for (username, first) in [("council1", "Carla"), ("council2", "Chris")] {
            councillors.push(
                ctx.users
                    .create_user(&new_user(username, first, "Council", &["Council"]))
                    .await
                    .unwrap(),
            );
        }
        let admin_group = ctx.users.find_group_by_name("Admin").await.unwrap().unwrap();
        let council = ctx.users.find_group_by_name("Council").await.unwrap().unwrap();

        Self {
            ctx,
            queue,
            outbox,
            admin,
            member,
            bot,
            councillors,
            admin_group,
            council,
        }
    }

    /// Poll for the Admin group created by `admin`
    pub async fn create_poll(&self, name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Poll {
        self.poll_service
            .create_poll(NewPoll::new(name, start, end, self.admin_group.id, self.admin.id))
            .await
            .unwrap()
    }
}

pub fn new_user(username: &str, first_name: &str, last_name: &str, groups: &[&str]) -> NewUser {
    NewUser {
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", username),
        receive_email_on_add_voting_comment: true,
        groups: groups.iter().map(|g| g.to_string()).collect(),
    }
}
