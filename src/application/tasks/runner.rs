use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::errors::Result;
use crate::application::services::email_builder::EmailBuilder;
use crate::application::templates::EmailTemplate;
use crate::domain::entities::email::EmailMessage;
use crate::domain::entities::poll::Poll;
use crate::domain::entities::scheduled_job::{Job, ReminderKind, ScheduledJob};
use crate::domain::repositories::mailer::Mailer;
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::task_queue::TaskQueue;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::repositories::vote_repository::VoteRepository;

/// How long an under-voted automated poll stays open after its first deadline
pub const EXTEND_VOTING_PERIOD_HOURS: i64 = 48;

/// Executes queued jobs
pub struct JobRunner {
    polls: Arc<dyn PollRepository>,
    users: Arc<dyn UserRepository>,
    votes: Arc<dyn VoteRepository>,
    queue: Arc<dyn TaskQueue>,
    mailer: Arc<dyn Mailer>,
    emails: EmailBuilder,
}

impl JobRunner {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        users: Arc<dyn UserRepository>,
        votes: Arc<dyn VoteRepository>,
        queue: Arc<dyn TaskQueue>,
        mailer: Arc<dyn Mailer>,
        emails: EmailBuilder,
    ) -> Self {
        Self {
            polls,
            users,
            votes,
            queue,
            mailer,
            emails,
        }
    }

    /// Run `job` queued under `task_id`. Reminders that are no longer the
    /// poll's scheduled task (an edit whose revoke failed) are skipped.
    pub async fn run(&self, task_id: &str, job: &Job) -> Result<()> {
        match job {
            Job::SendMail(message) => {
                self.mailer.send(message).await?;
                Ok(())
            }
            Job::VotingReminder { poll_id, kind } => {
                let Some(poll) = self.polls.get(*poll_id).await? else {
                    warn!("Reminder for deleted poll #{} skipped", poll_id);
                    return Ok(());
                };
                if poll.reminder_task_id(*kind) != Some(task_id) {
                    warn!(
                        "Stale {:?} reminder {} for poll #{} skipped",
                        kind, task_id, poll.id
                    );
                    return Ok(());
                }
                match kind {
                    ReminderKind::Start => self.voting_started(&poll).await,
                    ReminderKind::End => self.voting_ended(&poll).await,
                }
            }
        }
    }

    async fn voting_started(&self, poll: &Poll) -> Result<()> {
        let recipients = if poll.automated_poll {
            vec![self.emails.settings().council_alias.clone()]
        } else {
            self.group_emails(poll.valid_group_id).await?
        };
        let subject = format!("[Voting] Cast your vote for \"{}\" now!", poll.name);
        let messages = self.emails.build(
            &subject,
            EmailTemplate::StartingReminder.path(),
            &recipients,
            &self.emails.poll_context(poll),
        );
        self.deliver(messages).await
    }

    async fn voting_ended(&self, poll: &Poll) -> Result<()> {
        if poll.automated_poll && !poll.is_extended && self.lacks_quorum(poll).await? {
            return self.extend_voting(poll).await;
        }

        let Some(creator) = self.users.get(poll.created_by_id).await? else {
            warn!("Creator of poll #{} no longer exists, results not sent", poll.id);
            return Ok(());
        };
        let subject = format!("[Voting] Results for \"{}\"", poll.name);
        let messages = self.emails.build(
            &subject,
            EmailTemplate::ResultsReminder.path(),
            &[creator.email],
            &self.emails.poll_context(poll),
        );
        self.deliver(messages).await
    }

    /// Fewer than half of the valid group has voted
    async fn lacks_quorum(&self, poll: &Poll) -> Result<bool> {
        let members = self.users.members_of_group(poll.valid_group_id).await?.len() as i64;
        let votes = self.votes.count_for_poll(poll.id).await?;
        Ok(votes * 2 < members)
    }

    async fn extend_voting(&self, poll: &Poll) -> Result<()> {
        let new_end = poll.end + Duration::hours(EXTEND_VOTING_PERIOD_HOURS);
        self.polls.set_extended(poll.id, new_end).await?;

        let task_id = uuid::Uuid::new_v4().to_string();
        self.queue
            .push(ScheduledJob::new(
                task_id.clone(),
                new_end,
                Job::VotingReminder {
                    poll_id: poll.id,
                    kind: ReminderKind::End,
                },
            ))
            .await?;
        self.polls
            .set_task_ids(poll.id, poll.task_start_id.clone(), Some(task_id))
            .await?;

        info!("Voting for poll #{} extended until {}", poll.id, new_end);

        let mut extended = poll.clone();
        extended.end = new_end;
        extended.is_extended = true;
        let mut context = self.emails.poll_context(&extended);
        context["extended_at"] = json!(Utc::now());
        let subject = format!("[Voting] Voting extended for \"{}\"", poll.name);
        let messages = self.emails.build(
            &subject,
            EmailTemplate::VotingExtended.path(),
            &[self.emails.settings().council_alias.clone()],
            &context,
        );
        self.deliver(messages).await
    }

    async fn group_emails(&self, group_id: i64) -> Result<Vec<String>> {
        Ok(self
            .users
            .members_of_group(group_id)
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect())
    }

    async fn deliver(&self, messages: Vec<EmailMessage>) -> Result<()> {
        for message in &messages {
            self.mailer.send(message).await?;
        }
        Ok(())
    }
}
