use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::domain::entities::poll_comment::PollComment;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::infrastructure::database::connection::DatabaseManager;
use crate::infrastructure::repositories::timestamps::{from_db, to_db};

#[derive(Debug, Clone)]
pub struct SqliteCommentRepository {
    db: DatabaseManager,
}

impl SqliteCommentRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn insert(
        &self,
        poll_id: i64,
        user_id: i64,
        comment: &str,
        created_on: DateTime<Utc>,
    ) -> Result<PollComment> {
        if comment.trim().is_empty() {
            return Err(RepositoryError::InvalidData("Comment cannot be empty".into()));
        }

        let comment = comment.to_string();
        let created = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO poll_comments (poll_id, user_id, created_on, comment) VALUES (?1, ?2, ?3, ?4)",
                    params![poll_id, user_id, to_db(created_on), comment],
                )?;
                Ok(PollComment {
                    id: conn.last_insert_rowid(),
                    poll_id,
                    user_id,
                    created_on,
                    comment,
                })
            })
            .await?;
        Ok(created)
    }

    async fn list_for_poll(&self, poll_id: i64) -> Result<Vec<PollComment>> {
        let comments = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, poll_id, user_id, created_on, comment FROM poll_comments
                     WHERE poll_id = ?1 ORDER BY created_on, id",
                )?;
                let rows = stmt.query_map(params![poll_id], |row| {
                    Ok(PollComment {
                        id: row.get(0)?,
                        poll_id: row.get(1)?,
                        user_id: row.get(2)?,
                        created_on: from_db(row.get(3)?)?,
                        comment: row.get(4)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;
        Ok(comments)
    }
}
