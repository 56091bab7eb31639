use std::fmt;

use crate::domain::repositories::error::RepositoryError;
use crate::domain::repositories::mailer::MailError;
use crate::domain::repositories::task_queue::QueueError;

#[derive(Debug)]
pub enum VotingError {
    NotFound(String),
    Validation(String),
    NotAllowed(String),
    AlreadyVoted,
    VotingClosed,
    CommentsDisabled,
    Configuration(String),
    Repository(RepositoryError),
    Queue(QueueError),
    Mail(MailError),
    Serialization(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VotingError>;

impl fmt::Display for VotingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VotingError::NotFound(what) => write!(f, "{} not found", what),
            VotingError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            VotingError::NotAllowed(msg) => write!(f, "Not allowed: {}", msg),
            VotingError::AlreadyVoted => write!(f, "User has already voted in this poll"),
            VotingError::VotingClosed => write!(f, "Voting is not open"),
            VotingError::CommentsDisabled => write!(f, "Comments are disabled for this poll"),
            VotingError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            VotingError::Repository(e) => write!(f, "{}", e),
            VotingError::Queue(e) => write!(f, "Task queue error: {}", e),
            VotingError::Mail(e) => write!(f, "{}", e),
            VotingError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for VotingError {}

impl From<RepositoryError> for VotingError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::InvalidData(msg) => VotingError::Validation(msg),
            other => VotingError::Repository(other),
        }
    }
}

impl From<QueueError> for VotingError {
    fn from(e: QueueError) -> Self {
        VotingError::Queue(e)
    }
}

impl From<MailError> for VotingError {
    fn from(e: MailError) -> Self {
        VotingError::Mail(e)
    }
}

impl From<serde_json::Error> for VotingError {
    fn from(e: serde_json::Error) -> Self {
        VotingError::Serialization(e)
    }
}
