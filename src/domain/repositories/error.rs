use std::fmt;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    AlreadyExists,
    InvalidData(String),
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Record not found"),
            RepositoryError::AlreadyExists => write!(f, "Record already exists"),
            RepositoryError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            RepositoryError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<rusqlite::Error> for RepositoryError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                RepositoryError::AlreadyExists
            }
            other => RepositoryError::StorageError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for RepositoryError {
    fn from(e: anyhow::Error) -> Self {
        // unwrap the rusqlite error wrapped by DatabaseManager so constraint violations survive
        match e.downcast::<rusqlite::Error>() {
            Ok(sqlite) => sqlite.into(),
            Err(other) => RepositoryError::StorageError(format!("{:#}", other)),
        }
    }
}
