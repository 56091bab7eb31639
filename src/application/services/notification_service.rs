use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::errors::Result;
use crate::application::services::email_builder::EmailBuilder;
use crate::application::tasks::TaskDispatcher;
use crate::application::templates::EmailTemplate;
use crate::domain::entities::bug::Bug;
use crate::domain::entities::poll::Poll;
use crate::domain::entities::poll_comment::PollComment;
use crate::domain::entities::scheduled_job::Job;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::user_repository::UserRepository;

/// Builds voting emails and hands them to the task queue
#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    emails: EmailBuilder,
    dispatcher: Arc<TaskDispatcher>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        emails: EmailBuilder,
        dispatcher: Arc<TaskDispatcher>,
    ) -> Self {
        Self {
            users,
            comments,
            emails,
            dispatcher,
        }
    }

    /// Queue one message per distinct recipient. Returns how many were queued.
    pub async fn send_mail(
        &self,
        subject: &str,
        template: &str,
        recipients: &[String],
        context: &Value,
    ) -> Result<usize> {
        let messages = self.emails.build(subject, template, recipients, context);
        let count = messages.len();
        for message in messages {
            self.dispatcher.delay(Job::SendMail(message)).await?;
        }
        debug!("Queued {} email(s) '{}'", count, subject);
        Ok(count)
    }

    /// Tell every member of the valid group about a new poll
    pub async fn poll_created(&self, poll: &Poll) -> Result<usize> {
        let recipients: Vec<String> = self
            .users
            .members_of_group(poll.valid_group_id)
            .await?
            .into_iter()
            .map(|u| u.email)
            .collect();

        let subject = format!("[Voting] New voting \"{}\"", poll.name);
        self.send_mail(
            &subject,
            EmailTemplate::NewPoll.path(),
            &recipients,
            &self.emails.poll_context(poll),
        )
        .await
    }

    /// Tell the creator their poll changed
    pub async fn poll_edited(&self, poll: &Poll) -> Result<usize> {
        let Some(creator) = self.users.get(poll.created_by_id).await? else {
            return Ok(0);
        };

        let subject = format!("[Voting] Voting \"{}\" was updated", poll.name);
        self.send_mail(
            &subject,
            EmailTemplate::PollEdited.path(),
            &[creator.email],
            &self.emails.poll_context(poll),
        )
        .await
    }

    /// Ask the council to discuss a freshly created automated poll. Edits never resend.
    pub async fn automated_poll_discussion_email(
        &self,
        poll: &Poll,
        bug: &Bug,
        created: bool,
    ) -> Result<usize> {
        if !created || !poll.automated_poll {
            return Ok(0);
        }

        let settings = self.emails.settings();
        let subject = format!("Discuss [Bug {}] - {}", bug.bug_id, bug.summary);
        let context = json!({
            "bug": bug,
            "BUGZILLA_URL": settings.bugzilla_url,
            "poll": poll,
        });
        let sent = self
            .send_mail(
                &subject,
                EmailTemplate::BudgetDiscussion.path(),
                &[settings.council_alias.clone()],
                &context,
            )
            .await?;
        info!("Council asked to discuss bug {} (poll #{})", bug.bug_id, poll.id);
        Ok(sent)
    }

    /// Notify the creator and earlier commenters who opted in, never the commenter
    pub async fn comment_added(&self, poll: &Poll, comment: &PollComment) -> Result<usize> {
        let Some(commenter) = self.users.get(comment.user_id).await? else {
            return Ok(0);
        };

        let mut candidates = vec![poll.created_by_id];
        for earlier in self.comments.list_for_poll(poll.id).await? {
            if earlier.id != comment.id && !candidates.contains(&earlier.user_id) {
                candidates.push(earlier.user_id);
            }
        }

        let mut recipients = Vec::new();
        for user_id in candidates {
            if user_id == commenter.id {
                continue;
            }
            if let Some(user) = self.users.get(user_id).await? {
                if user.receive_email_on_add_voting_comment {
                    recipients.push(user.mailbox());
                }
            }
        }

        let subject = format!(
            "[Voting] User {} commented on {}",
            commenter.full_name(),
            poll
        );
        let mut context = self.emails.poll_context(poll);
        context["commenter"] = json!(commenter.full_name());
        context["comment"] = json!(comment.comment);

        self.send_mail(
            &subject,
            EmailTemplate::PollComment.path(),
            &recipients,
            &context,
        )
        .await
    }
}
