use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use crate::domain::entities::bug::{Bug, BugRecord};
use crate::domain::repositories::bug_repository::BugRepository;
use crate::domain::repositories::error::Result;
use crate::infrastructure::database::connection::DatabaseManager;
use crate::infrastructure::repositories::timestamps::{from_db, to_db};

const BUG_COLUMNS: &str =
    "id, bug_id, summary, first_comment, component, council_vote_requested, updated_on";

#[derive(Debug, Clone)]
pub struct SqliteBugRepository {
    db: DatabaseManager,
}

impl SqliteBugRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_bug(row: &Row) -> rusqlite::Result<Bug> {
        Ok(Bug {
            id: row.get(0)?,
            bug_id: row.get(1)?,
            summary: row.get(2)?,
            first_comment: row.get(3)?,
            component: row.get(4)?,
            council_vote_requested: row.get::<_, i64>(5)? != 0,
            updated_on: from_db(row.get(6)?)?,
        })
    }
}

#[async_trait]
impl BugRepository for SqliteBugRepository {
    async fn upsert(&self, record: &BugRecord) -> Result<Bug> {
        let record = record.clone();
        let now = Utc::now();
        let bug = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO bugs (bug_id, summary, first_comment, component, council_vote_requested, updated_on)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(bug_id) DO UPDATE SET
                        summary = excluded.summary,
                        first_comment = excluded.first_comment,
                        component = excluded.component,
                        council_vote_requested = excluded.council_vote_requested,
                        updated_on = excluded.updated_on
                    "#,
                    params![
                        record.bug_id,
                        record.summary,
                        record.first_comment,
                        record.component,
                        record.council_vote_requested as i64,
                        to_db(now)
                    ],
                )?;
                conn.query_row(
                    &format!("SELECT {} FROM bugs WHERE bug_id = ?1", BUG_COLUMNS),
                    params![record.bug_id],
                    Self::row_to_bug,
                )
            })
            .await?;
        Ok(bug)
    }

    async fn get(&self, bug_pk: i64) -> Result<Option<Bug>> {
        let bug = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM bugs WHERE id = ?1", BUG_COLUMNS),
                    params![bug_pk],
                    Self::row_to_bug,
                )
                .optional()
            })
            .await?;
        Ok(bug)
    }

    async fn find_by_bug_id(&self, bug_id: i64) -> Result<Option<Bug>> {
        let bug = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM bugs WHERE bug_id = ?1", BUG_COLUMNS),
                    params![bug_id],
                    Self::row_to_bug,
                )
                .optional()
            })
            .await?;
        Ok(bug)
    }
}
