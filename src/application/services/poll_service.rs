use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::errors::{Result, VotingError};
use crate::application::services::notification_service::NotificationService;
use crate::application::tasks::TaskDispatcher;
use crate::domain::entities::poll::{NewPoll, Poll, PollChanges};
use crate::domain::entities::poll_comment::PollComment;
use crate::domain::entities::scheduled_job::{Job, ReminderKind};
use crate::domain::repositories::bug_repository::BugRepository;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::user_repository::UserRepository;

/// Poll lifecycle: create, edit, comment, delete, with the side effects each one triggers
#[derive(Clone)]
pub struct PollService {
    polls: Arc<dyn PollRepository>,
    users: Arc<dyn UserRepository>,
    bugs: Arc<dyn BugRepository>,
    comments: Arc<dyn CommentRepository>,
    notifications: Arc<NotificationService>,
    dispatcher: Arc<TaskDispatcher>,
}

impl PollService {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        users: Arc<dyn UserRepository>,
        bugs: Arc<dyn BugRepository>,
        comments: Arc<dyn CommentRepository>,
        notifications: Arc<NotificationService>,
        dispatcher: Arc<TaskDispatcher>,
    ) -> Self {
        Self {
            polls,
            users,
            bugs,
            comments,
            notifications,
            dispatcher,
        }
    }

    pub async fn get_poll(&self, poll_id: i64) -> Result<Poll> {
        self.polls
            .get(poll_id)
            .await?
            .ok_or_else(|| VotingError::NotFound(format!("Poll #{}", poll_id)))
    }

    // === CREATE / EDIT ===

    pub async fn create_poll(&self, new_poll: NewPoll) -> Result<Poll> {
        if new_poll.name.trim().is_empty() {
            return Err(VotingError::Validation("Poll name cannot be empty".into()));
        }
        if new_poll.end <= new_poll.start {
            return Err(VotingError::Validation("Poll must end after it starts".into()));
        }
        self.ensure_group(new_poll.valid_group_id).await?;
        if self.users.get(new_poll.created_by_id).await?.is_none() {
            return Err(VotingError::NotFound(format!("User #{}", new_poll.created_by_id)));
        }

        let poll = self.polls.insert(&new_poll).await?;
        info!("Poll #{} '{}' created", poll.id, poll.name);

        self.on_poll_saved(&poll, true).await?;
        self.get_poll(poll.id).await
    }

    pub async fn update_poll(&self, poll_id: i64, changes: PollChanges) -> Result<Poll> {
        let mut poll = self.get_poll(poll_id).await?;
        changes.apply(&mut poll);

        if poll.name.trim().is_empty() {
            return Err(VotingError::Validation("Poll name cannot be empty".into()));
        }
        if poll.end <= poll.start {
            return Err(VotingError::Validation("Poll must end after it starts".into()));
        }
        self.ensure_group(poll.valid_group_id).await?;

        self.polls.update(&poll).await?;
        info!("Poll #{} '{}' edited", poll.id, poll.name);

        self.on_poll_saved(&poll, false).await?;
        self.get_poll(poll.id).await
    }

    /// Post-save hook shared by create and edit. The poll row is already
    /// stored, so mail failures are logged and reminders still get scheduled.
    async fn on_poll_saved(&self, poll: &Poll, created: bool) -> Result<()> {
        if let Err(e) = self.send_poll_notifications(poll, created).await {
            error!("Notifications for poll #{} failed: {}", poll.id, e);
        }
        self.reschedule_reminders(poll).await
    }

    async fn send_poll_notifications(&self, poll: &Poll, created: bool) -> Result<()> {
        if created {
            self.notifications.poll_created(poll).await?;
        } else {
            self.notifications.poll_edited(poll).await?;
        }

        if poll.automated_poll {
            match poll.bug_id {
                Some(bug_pk) => match self.bugs.get(bug_pk).await? {
                    Some(bug) => {
                        self.notifications
                            .automated_poll_discussion_email(poll, &bug, created)
                            .await?;
                    }
                    None => warn!("Automated poll #{} points to missing bug {}", poll.id, bug_pk),
                },
                None => warn!("Automated poll #{} has no bug", poll.id),
            }
        }
        Ok(())
    }

    /// Revoke the poll's outstanding reminders and queue new ones for its current window
    async fn reschedule_reminders(&self, poll: &Poll) -> Result<()> {
        for task_id in poll.scheduled_task_ids() {
            self.dispatcher.revoke(task_id).await;
        }

        let now = Utc::now();
        let task_start_id = if poll.is_future_voting(now) {
            let job = Job::VotingReminder {
                poll_id: poll.id,
                kind: ReminderKind::Start,
            };
            Some(self.dispatcher.apply_async(job, poll.start).await?)
        } else {
            None
        };
        let task_end_id = if !poll.is_past_voting(now) {
            let job = Job::VotingReminder {
                poll_id: poll.id,
                kind: ReminderKind::End,
            };
            Some(self.dispatcher.apply_async(job, poll.end).await?)
        } else {
            None
        };

        self.polls
            .set_task_ids(poll.id, task_start_id, task_end_id)
            .await?;
        Ok(())
    }

    // === DELETE ===

    /// Revoke pending reminders, then delete. Revocation never blocks the delete.
    pub async fn delete_poll(&self, poll_id: i64) -> Result<()> {
        let poll = self.get_poll(poll_id).await?;

        for task_id in poll.scheduled_task_ids() {
            if !self.dispatcher.revoke(task_id).await {
                warn!("Deleting poll #{} with unrevoked task {}", poll.id, task_id);
            }
        }

        self.polls.delete(poll.id).await?;
        info!("Poll #{} '{}' deleted", poll.id, poll.name);
        Ok(())
    }

    // === COMMENTS ===

    pub async fn add_comment(&self, poll_id: i64, user_id: i64, comment: &str) -> Result<PollComment> {
        let poll = self.get_poll(poll_id).await?;
        if !poll.comments_allowed {
            return Err(VotingError::CommentsDisabled);
        }
        if self.users.get(user_id).await?.is_none() {
            return Err(VotingError::NotFound(format!("User #{}", user_id)));
        }

        let created = self
            .comments
            .insert(poll.id, user_id, comment, Utc::now())
            .await?;
        self.notifications.comment_added(&poll, &created).await?;
        Ok(created)
    }

    async fn ensure_group(&self, group_id: i64) -> Result<()> {
        if self.users.get_group(group_id).await?.is_none() {
            return Err(VotingError::NotFound(format!("Group #{}", group_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{COUNCIL_ALIAS, TestApp, new_user};
    use crate::domain::entities::bug::BugRecord;
    use chrono::Duration;
    use std::collections::HashSet;

    fn future_window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        let now = Utc::now();
        (now + Duration::days(1), now + Duration::days(4))
    }

    #[tokio::test]
    async fn creating_poll_mails_each_group_member() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Council election", start, end).await;

        let sent = app.outbox.messages().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.subject == "[Voting] New voting \"Council election\""));
        assert!(sent.iter().all(|m| m.template == "emails/voting_new_poll.txt"));
        let to: HashSet<String> = sent.iter().flat_map(|m| m.to.clone()).collect();
        assert_eq!(
            to,
            HashSet::from(["admin@example.com".to_string(), "mary@example.com".to_string()])
        );

        assert!(poll.task_start_id.is_some());
        assert!(poll.task_end_id.is_some());
        assert_eq!(app.queue.pending_jobs().await.len(), 2);
    }

    #[tokio::test]
    async fn editing_poll_revokes_tasks_and_mails_creator() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Swag", start, end).await;
        app.polls
            .set_task_ids(poll.id, Some("1234".into()), Some("1234".into()))
            .await
            .unwrap();

        let edited = app
            .poll_service
            .update_poll(
                poll.id,
                PollChanges {
                    description: Some("New swag for everyone".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sent = app.outbox.messages().await;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].subject, "[Voting] Voting \"Swag\" was updated");
        assert_eq!(sent[2].to, vec!["admin@example.com"]);
        assert_eq!(app.queue.revoked_ids().await, vec!["1234", "1234"]);

        assert_eq!(edited.description, "New swag for everyone");
        assert_ne!(edited.task_start_id.as_deref(), Some("1234"));
        assert_ne!(edited.task_end_id.as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn past_poll_gets_no_reminders() {
        let app = TestApp::new().await;
        let now = Utc::now();
        let poll = app
            .create_poll("Old", now - Duration::days(3), now - Duration::days(1))
            .await;
        assert!(poll.task_start_id.is_none());
        assert!(poll.task_end_id.is_none());
        assert!(app.queue.pending_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_polls_are_rejected() {
        let app = TestApp::new().await;
        let now = Utc::now();
        let backwards = NewPoll::new("Backwards", now, now - Duration::hours(1), app.admin_group.id, app.admin.id);
        assert!(matches!(
            app.poll_service.create_poll(backwards).await,
            Err(VotingError::Validation(_))
        ));

        let orphan = NewPoll::new("Orphan", now, now + Duration::hours(1), 999, app.admin.id);
        assert!(matches!(
            app.poll_service.create_poll(orphan).await,
            Err(VotingError::NotFound(_))
        ));
        assert!(app.outbox.messages().await.is_empty());
    }

    #[tokio::test]
    async fn automated_poll_discussion_sent_only_on_creation() {
        let app = TestApp::new().await;
        app.bug_service
            .save(BugRecord {
                bug_id: 989812,
                summary: "Budget for Rep event".into(),
                first_comment: "Details".into(),
                component: "Budget Requests".into(),
                council_vote_requested: true,
            })
            .await
            .unwrap();

        let sent = app.outbox.messages().await;
        let discussion: Vec<_> = sent
            .iter()
            .filter(|m| m.template == "emails/review_budget_notify_council.txt")
            .collect();
        assert_eq!(discussion.len(), 1);
        assert_eq!(discussion[0].subject, "Discuss [Bug 989812] - Budget for Rep event");
        assert_eq!(discussion[0].to, vec![COUNCIL_ALIAS]);
        assert_eq!(discussion[0].context["bug"]["bug_id"], 989812);
        assert!(discussion[0].context["BUGZILLA_URL"].is_string());

        app.outbox.clear().await;
        let poll = app.polls.list().await.unwrap().remove(0);
        app.poll_service
            .update_poll(
                poll.id,
                PollChanges {
                    name: Some("Budget for Rep event (revised)".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sent = app.outbox.messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["remobot@example.com"]);
        assert!(!sent.iter().any(|m| m.subject.starts_with("Discuss")));
    }

    #[tokio::test]
    async fn comment_notifies_creator_with_flag() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Swag", start, end).await;
        app.outbox.clear().await;

        app.poll_service
            .add_comment(poll.id, app.member.id, "Love it")
            .await
            .unwrap();

        let sent = app.outbox.messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["Alex Smith <admin@example.com>"]);
        assert_eq!(
            sent[0].subject,
            "[Voting] User Mary Anderson commented on Swag"
        );
        assert_eq!(
            sent[0].template,
            "emails/user_notification_on_add_poll_comment.txt"
        );
    }

    #[tokio::test]
    async fn comment_skips_creator_without_flag() {
        let app = TestApp::new().await;
        app.users
            .set_comment_notifications(app.admin.id, false)
            .await
            .unwrap();
        let (start, end) = future_window();
        let poll = app.create_poll("Swag", start, end).await;
        app.outbox.clear().await;

        app.poll_service
            .add_comment(poll.id, app.member.id, "Love it")
            .await
            .unwrap();
        assert!(app.outbox.messages().await.is_empty());
    }

    #[tokio::test]
    async fn comment_notifies_every_prior_commenter_once() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Swag", start, end).await;
        let first = app
            .users
            .create_user(&new_user("first", "First", "Commenter", &[]))
            .await
            .unwrap();
        let second = app
            .users
            .create_user(&new_user("second", "Second", "Commenter", &[]))
            .await
            .unwrap();
        for (user, text) in [(&first, "One"), (&second, "Two"), (&first, "Three")] {
            app.poll_service.add_comment(poll.id, user.id, text).await.unwrap();
        }
        app.outbox.clear().await;

        app.poll_service
            .add_comment(poll.id, app.member.id, "Four")
            .await
            .unwrap();

        let to: HashSet<String> = app
            .outbox
            .messages()
            .await
            .into_iter()
            .flat_map(|m| m.to)
            .collect();
        assert_eq!(app.outbox.messages().await.len(), 3);
        assert_eq!(
            to,
            HashSet::from([
                "Alex Smith <admin@example.com>".to_string(),
                "First Commenter <first@example.com>".to_string(),
                "Second Commenter <second@example.com>".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn comments_can_be_disabled() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let mut new_poll = NewPoll::new("Quiet", start, end, app.admin_group.id, app.admin.id);
        new_poll.comments_allowed = false;
        let poll = app.poll_service.create_poll(new_poll).await.unwrap();

        let err = app
            .poll_service
            .add_comment(poll.id, app.member.id, "Hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::CommentsDisabled));
    }

    #[tokio::test]
    async fn delete_revokes_end_then_start() {
        let app = TestApp::new().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Temporary", start, end).await;

        app.poll_service.delete_poll(poll.id).await.unwrap();

        assert_eq!(
            app.queue.revoked_ids().await,
            vec![poll.task_end_id.unwrap(), poll.task_start_id.unwrap()]
        );
        assert!(app.queue.pending_jobs().await.is_empty());
        assert!(matches!(
            app.poll_service.get_poll(poll.id).await,
            Err(VotingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unqueueable_mail_does_not_abort_create() {
        let app = TestApp::with_unqueueable_mail().await;
        let (start, end) = future_window();
        let poll = app.create_poll("Council election", start, end).await;

        assert!(app.outbox.messages().await.is_empty());
        assert!(poll.task_start_id.is_some());
        assert!(poll.task_end_id.is_some());
        assert_eq!(app.queue.pending_jobs().await.len(), 2);
        assert_eq!(app.polls.list().await.unwrap().len(), 1);
    }
}
