use std::sync::Arc;

use crate::application::admin::{AdminSite, PollAdmin, RadioPollAdmin, RangePollAdmin, VoteAdmin};
use crate::application::services::automated_poll_service::AutomatedPollService;
use crate::application::services::bug_service::BugService;
use crate::application::services::email_builder::EmailBuilder;
use crate::application::services::notification_service::NotificationService;
use crate::application::services::poll_service::PollService;
use crate::application::services::voting_service::VotingService;
use crate::application::tasks::{JobRunner, TaskDispatcher};
use crate::domain::repositories::bug_repository::BugRepository;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::mailer::Mailer;
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::task_queue::TaskQueue;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::repositories::vote_repository::VoteRepository;
use crate::infrastructure::config::Settings;
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::{
    SqliteBugRepository, SqliteCommentRepository, SqlitePollRepository, SqliteUserRepository,
    SqliteVoteRepository,
};

/// Every repository and service, wired once
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub users: Arc<dyn UserRepository>,
    pub polls: Arc<dyn PollRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub bugs: Arc<dyn BugRepository>,
    pub task_queue: Arc<dyn TaskQueue>,
    pub runner: Arc<JobRunner>,
    pub dispatcher: Arc<TaskDispatcher>,
    pub notifications: Arc<NotificationService>,
    pub poll_service: Arc<PollService>,
    pub automated: Arc<AutomatedPollService>,
    pub bug_service: Arc<BugService>,
    pub voting: Arc<VotingService>,
    pub admin_site: AdminSite,
}

impl AppContext {
    pub fn build(
        settings: Arc<Settings>,
        db: DatabaseManager,
        task_queue: Arc<dyn TaskQueue>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db.clone()));
        let polls: Arc<dyn PollRepository> = Arc::new(SqlitePollRepository::new(db.clone()));
        let votes: Arc<dyn VoteRepository> = Arc::new(SqliteVoteRepository::new(db.clone()));
        let comments: Arc<dyn CommentRepository> =
            Arc::new(SqliteCommentRepository::new(db.clone()));
        let bugs: Arc<dyn BugRepository> = Arc::new(SqliteBugRepository::new(db));

        let emails = EmailBuilder::new(settings.clone());
        let runner = Arc::new(JobRunner::new(
            polls.clone(),
            users.clone(),
            votes.clone(),
            task_queue.clone(),
            mailer,
            emails.clone(),
        ));
        let dispatcher = Arc::new(TaskDispatcher::new(
            task_queue.clone(),
            runner.clone(),
            settings.task_always_eager,
        ));

        let notifications = Arc::new(NotificationService::new(
            users.clone(),
            comments.clone(),
            emails,
            dispatcher.clone(),
        ));
        let poll_service = Arc::new(PollService::new(
            polls.clone(),
            users.clone(),
            bugs.clone(),
            comments.clone(),
            notifications.clone(),
            dispatcher.clone(),
        ));
        let automated = Arc::new(AutomatedPollService::new(
            polls.clone(),
            users.clone(),
            poll_service.clone(),
            settings.clone(),
        ));
        let bug_service = Arc::new(BugService::new(bugs.clone(), automated.clone()));
        let voting = Arc::new(VotingService::new(polls.clone(), users.clone(), votes.clone()));

        let admin_site = AdminSite {
            polls: PollAdmin::new(
                polls.clone(),
                users.clone(),
                comments.clone(),
                votes.clone(),
                poll_service.clone(),
                settings.time_zone,
            ),
            votes: VoteAdmin::new(votes.clone()),
            range_polls: RangePollAdmin::new(polls.clone()),
            radio_polls: RadioPollAdmin::new(polls.clone()),
        };

        Self {
            settings,
            users,
            polls,
            votes,
            comments,
            bugs,
            task_queue,
            runner,
            dispatcher,
            notifications,
            poll_service,
            automated,
            bug_service,
            voting,
            admin_site,
        }
    }
}
