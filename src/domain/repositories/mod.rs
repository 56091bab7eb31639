pub mod bug_repository;
pub mod comment_repository;
pub mod error;
pub mod mailer;
pub mod poll_repository;
pub mod task_queue;
pub mod user_repository;
pub mod vote_repository;
