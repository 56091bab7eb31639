use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use crate::domain::entities::vote::{Ballot, Vote, VoteDetail};
use crate::domain::repositories::error::Result;
use crate::domain::repositories::vote_repository::VoteRepository;
use crate::infrastructure::database::connection::DatabaseManager;
use crate::infrastructure::repositories::timestamps::{from_db, to_db};

#[derive(Debug, Clone)]
pub struct SqliteVoteRepository {
    db: DatabaseManager,
}

impl SqliteVoteRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_vote(row: &Row) -> rusqlite::Result<Vote> {
        Ok(Vote {
            id: row.get(0)?,
            user_id: row.get(1)?,
            poll_id: row.get(2)?,
            date_voted: from_db(row.get(3)?)?,
        })
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepository {
    async fn record(
        &self,
        poll_id: i64,
        user_id: i64,
        date_voted: DateTime<Utc>,
        ballot: &Ballot,
    ) -> Result<Vote> {
        let ballot = ballot.clone();
        let vote = self
            .db
            .execute_blocking(move |conn| {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT INTO votes (user_id, poll_id, date_voted) VALUES (?1, ?2, ?3)",
                    params![user_id, poll_id, to_db(date_voted)],
                )?;
                let vote_id = tx.last_insert_rowid();

                // counters only move for choices that belong to this poll
                match &ballot {
                    Ballot::Radio { choice_id } => {
                        let updated = tx.execute(
                            "UPDATE radio_poll_choices SET votes = votes + 1
                             WHERE id = ?1 AND radio_poll_id IN (SELECT id FROM radio_polls WHERE poll_id = ?2)",
                            params![choice_id, poll_id],
                        )?;
                        if updated == 0 {
                            return Err(rusqlite::Error::QueryReturnedNoRows);
                        }
                    }
                    Ballot::Range { scores } => {
                        for (choice_id, score) in scores {
                            let updated = tx.execute(
                                "UPDATE range_poll_choices SET votes = votes + ?1
                                 WHERE id = ?2 AND range_poll_id IN (SELECT id FROM range_polls WHERE poll_id = ?3)",
                                params![score, choice_id, poll_id],
                            )?;
                            if updated == 0 {
                                return Err(rusqlite::Error::QueryReturnedNoRows);
                            }
                        }
                    }
                }
                tx.commit()?;

                Ok(Vote {
                    id: vote_id,
                    user_id,
                    poll_id,
                    date_voted,
                })
            })
            .await?;
        Ok(vote)
    }

    async fn has_voted(&self, poll_id: i64, user_id: i64) -> Result<bool> {
        let voted = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM votes WHERE poll_id = ?1 AND user_id = ?2)",
                    params![poll_id, user_id],
                    |row| row.get::<_, bool>(0),
                )
            })
            .await?;
        Ok(voted)
    }

    async fn count_for_poll(&self, poll_id: i64) -> Result<i64> {
        let count = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM votes WHERE poll_id = ?1",
                    params![poll_id],
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(count)
    }

    async fn list_for_poll(&self, poll_id: i64) -> Result<Vec<Vote>> {
        let votes = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, poll_id, date_voted FROM votes WHERE poll_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![poll_id], Self::row_to_vote)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;
        Ok(votes)
    }

    async fn list_detailed(&self) -> Result<Vec<VoteDetail>> {
        let votes = self
            .db
            .execute_blocking(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT v.id, v.user_id, v.poll_id, v.date_voted, u.first_name, u.last_name, p.name
                     FROM votes v
                     JOIN users u ON u.id = v.user_id
                     JOIN polls p ON p.id = v.poll_id
                     ORDER BY v.date_voted DESC, v.id DESC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(VoteDetail {
                        vote: Self::row_to_vote(row)?,
                        user_first_name: row.get(4)?,
                        user_last_name: row.get(5)?,
                        poll_name: row.get(6)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;
        Ok(votes)
    }
}
