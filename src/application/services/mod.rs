pub mod automated_poll_service;
pub mod bug_service;
pub mod email_builder;
pub mod notification_service;
pub mod poll_service;
pub mod voting_service;

pub use automated_poll_service::AutomatedPollService;
pub use bug_service::BugService;
pub use email_builder::EmailBuilder;
pub use notification_service::NotificationService;
pub use poll_service::PollService;
pub use voting_service::VotingService;
