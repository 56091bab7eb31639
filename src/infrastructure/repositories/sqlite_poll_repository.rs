use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::domain::entities::choices::{RadioPoll, RadioPollChoice, RangePoll, RangePollChoice};
use crate::domain::entities::poll::{NewPoll, Poll};
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::domain::repositories::poll_repository::PollRepository;
use crate::infrastructure::database::connection::DatabaseManager;
use crate::infrastructure::repositories::timestamps::{from_db, to_db};

const POLL_COLUMNS: &str = "id, name, description, start_at, end_at, valid_group_id, created_on, \
     created_by_id, automated_poll, is_extended, comments_allowed, bug_id, task_start_id, task_end_id";

#[derive(Debug, Clone)]
pub struct SqlitePollRepository {
    db: DatabaseManager,
}

impl SqlitePollRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_poll(row: &Row) -> rusqlite::Result<Poll> {
        Ok(Poll {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            start: from_db(row.get(3)?)?,
            end: from_db(row.get(4)?)?,
            valid_group_id: row.get(5)?,
            created_on: from_db(row.get(6)?)?,
            created_by_id: row.get(7)?,
            automated_poll: row.get::<_, i64>(8)? != 0,
            is_extended: row.get::<_, i64>(9)? != 0,
            comments_allowed: row.get::<_, i64>(10)? != 0,
            bug_id: row.get(11)?,
            task_start_id: row.get(12)?,
            task_end_id: row.get(13)?,
        })
    }

    fn load_range_polls(
        conn: &Connection,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> rusqlite::Result<Vec<RangePoll>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, poll_id, name FROM range_polls {} ORDER BY id",
            filter
        ))?;
        let mut polls = stmt
            .query_map(args, |row| {
                Ok(RangePoll {
                    id: row.get(0)?,
                    poll_id: row.get(1)?,
                    name: row.get(2)?,
                    choices: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut choices_stmt = conn.prepare(
            "SELECT id, range_poll_id, nominee_id, votes FROM range_poll_choices
             WHERE range_poll_id = ?1 ORDER BY id",
        )?;
        for poll in polls.iter_mut() {
            poll.choices = choices_stmt
                .query_map(params![poll.id], |row| {
                    Ok(RangePollChoice {
                        id: row.get(0)?,
                        range_poll_id: row.get(1)?,
                        nominee_id: row.get(2)?,
                        votes: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
        }
        Ok(polls)
    }

    fn load_radio_polls(
        conn: &Connection,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> rusqlite::Result<Vec<RadioPoll>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, poll_id, question FROM radio_polls {} ORDER BY id",
            filter
        ))?;
        let mut polls = stmt
            .query_map(args, |row| {
                Ok(RadioPoll {
                    id: row.get(0)?,
                    poll_id: row.get(1)?,
                    question: row.get(2)?,
                    choices: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut choices_stmt = conn.prepare(
            "SELECT id, radio_poll_id, answer, votes FROM radio_poll_choices
             WHERE radio_poll_id = ?1 ORDER BY id",
        )?;
        for poll in polls.iter_mut() {
            poll.choices = choices_stmt
                .query_map(params![poll.id], |row| {
                    Ok(RadioPollChoice {
                        id: row.get(0)?,
                        radio_poll_id: row.get(1)?,
                        answer: row.get(2)?,
                        votes: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
        }
        Ok(polls)
    }
}

#[async_trait]
impl PollRepository for SqlitePollRepository {
    async fn insert(&self, poll: &NewPoll) -> Result<Poll> {
        if poll.name.trim().is_empty() {
            return Err(RepositoryError::InvalidData("Poll name cannot be empty".into()));
        }
        for radio in &poll.radio_polls {
            if radio.question.trim().is_empty() || radio.answers.iter().any(|a| a.trim().is_empty()) {
                return Err(RepositoryError::InvalidData(
                    "Radio poll question and answers cannot be empty".into(),
                ));
            }
        }

        let new_poll = poll.clone();
        let created_on = Utc::now();
        let created = self
            .db
            .execute_blocking(move |conn| {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT INTO polls (name, description, start_at, end_at, valid_group_id, created_on,
                                        created_by_id, automated_poll, is_extended, comments_allowed, bug_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)",
                    params![
                        new_poll.name,
                        new_poll.description,
                        to_db(new_poll.start),
                        to_db(new_poll.end),
                        new_poll.valid_group_id,
                        to_db(created_on),
                        new_poll.created_by_id,
                        new_poll.automated_poll as i64,
                        new_poll.comments_allowed as i64,
                        new_poll.bug_id
                    ],
                )?;
                let id = tx.last_insert_rowid();
                for radio in &new_poll.radio_polls {
                    tx.execute(
                        "INSERT INTO radio_polls (poll_id, question) VALUES (?1, ?2)",
                        params![id, radio.question],
                    )?;
                    let radio_poll_id = tx.last_insert_rowid();
                    for answer in &radio.answers {
                        tx.execute(
                            "INSERT INTO radio_poll_choices (radio_poll_id, answer, votes) VALUES (?1, ?2, 0)",
                            params![radio_poll_id, answer],
                        )?;
                    }
                }
                let created = tx.query_row(
                    &format!("SELECT {} FROM polls WHERE id = ?1", POLL_COLUMNS),
                    params![id],
                    Self::row_to_poll,
                )?;
                tx.commit()?;
                Ok(created)
            })
            .await?;
        Ok(created)
    }

    async fn update(&self, poll: &Poll) -> Result<()> {
        let poll = poll.clone();
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE polls SET name = ?1, description = ?2, start_at = ?3, end_at = ?4,
                            valid_group_id = ?5, automated_poll = ?6, is_extended = ?7,
                            comments_allowed = ?8, bug_id = ?9
                     WHERE id = ?10",
                    params![
                        poll.name,
                        poll.description,
                        to_db(poll.start),
                        to_db(poll.end),
                        poll.valid_group_id,
                        poll.automated_poll as i64,
                        poll.is_extended as i64,
                        poll.comments_allowed as i64,
                        poll.bug_id,
                        poll.id
                    ],
                )
            })
            .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, poll_id: i64) -> Result<Option<Poll>> {
        let poll = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM polls WHERE id = ?1", POLL_COLUMNS),
                    params![poll_id],
                    Self::row_to_poll,
                )
                .optional()
            })
            .await?;
        Ok(poll)
    }

    async fn list(&self) -> Result<Vec<Poll>> {
        let polls = self
            .db
            .execute_blocking(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM polls ORDER BY start_at DESC, id DESC",
                    POLL_COLUMNS
                ))?;
                let rows = stmt.query_map([], Self::row_to_poll)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;
        Ok(polls)
    }

    async fn delete(&self, poll_id: i64) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute("DELETE FROM polls WHERE id = ?1", params![poll_id])
            })
            .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_bug(&self, bug_pk: i64) -> Result<Option<Poll>> {
        let poll = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM polls WHERE bug_id = ?1 ORDER BY id LIMIT 1",
                        POLL_COLUMNS
                    ),
                    params![bug_pk],
                    Self::row_to_poll,
                )
                .optional()
            })
            .await?;
        Ok(poll)
    }

    async fn set_task_ids(
        &self,
        poll_id: i64,
        task_start_id: Option<String>,
        task_end_id: Option<String>,
    ) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE polls SET task_start_id = ?1, task_end_id = ?2 WHERE id = ?3",
                    params![task_start_id, task_end_id, poll_id],
                )
            })
            .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_extended(&self, poll_id: i64, end: DateTime<Utc>) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE polls SET is_extended = 1, end_at = ?1 WHERE id = ?2",
                    params![to_db(end), poll_id],
                )
            })
            .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_range_poll(&self, poll_id: i64, name: &str) -> Result<RangePoll> {
        let name = name.to_string();
        let range_poll = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO range_polls (poll_id, name) VALUES (?1, ?2)",
                    params![poll_id, name],
                )?;
                Ok(RangePoll {
                    id: conn.last_insert_rowid(),
                    poll_id,
                    name,
                    choices: Vec::new(),
                })
            })
            .await?;
        Ok(range_poll)
    }

    async fn add_range_choice(&self, range_poll_id: i64, nominee_id: i64) -> Result<RangePollChoice> {
        let choice = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO range_poll_choices (range_poll_id, nominee_id, votes) VALUES (?1, ?2, 0)",
                    params![range_poll_id, nominee_id],
                )?;
                Ok(RangePollChoice {
                    id: conn.last_insert_rowid(),
                    range_poll_id,
                    nominee_id,
                    votes: 0,
                })
            })
            .await?;
        Ok(choice)
    }

    async fn range_polls(&self, poll_id: i64) -> Result<Vec<RangePoll>> {
        let polls = self
            .db
            .execute_blocking(move |conn| {
                Self::load_range_polls(conn, "WHERE poll_id = ?1", &[&poll_id])
            })
            .await?;
        Ok(polls)
    }

    async fn list_range_polls(&self) -> Result<Vec<RangePoll>> {
        let polls = self
            .db
            .execute_blocking(|conn| Self::load_range_polls(conn, "", &[]))
            .await?;
        Ok(polls)
    }

    async fn add_radio_poll(&self, poll_id: i64, question: &str) -> Result<RadioPoll> {
        let question = question.to_string();
        let radio_poll = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO radio_polls (poll_id, question) VALUES (?1, ?2)",
                    params![poll_id, question],
                )?;
                Ok(RadioPoll {
                    id: conn.last_insert_rowid(),
                    poll_id,
                    question,
                    choices: Vec::new(),
                })
            })
            .await?;
        Ok(radio_poll)
    }

    async fn add_radio_choice(&self, radio_poll_id: i64, answer: &str) -> Result<RadioPollChoice> {
        let answer = answer.to_string();
        let choice = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO radio_poll_choices (radio_poll_id, answer, votes) VALUES (?1, ?2, 0)",
                    params![radio_poll_id, answer],
                )?;
                Ok(RadioPollChoice {
                    id: conn.last_insert_rowid(),
                    radio_poll_id,
                    answer,
                    votes: 0,
                })
            })
            .await?;
        Ok(choice)
    }

    async fn radio_polls(&self, poll_id: i64) -> Result<Vec<RadioPoll>> {
        let polls = self
            .db
            .execute_blocking(move |conn| {
                Self::load_radio_polls(conn, "WHERE poll_id = ?1", &[&poll_id])
            })
            .await?;
        Ok(polls)
    }

    async fn list_radio_polls(&self) -> Result<Vec<RadioPoll>> {
        let polls = self
            .db
            .execute_blocking(|conn| Self::load_radio_polls(conn, "", &[]))
            .await?;
        Ok(polls)
    }
}
