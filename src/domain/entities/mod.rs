pub mod bug;
pub mod choices;
pub mod email;
pub mod poll;
pub mod poll_comment;
pub mod scheduled_job;
pub mod user;
pub mod vote;
