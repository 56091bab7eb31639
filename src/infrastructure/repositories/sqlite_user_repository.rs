use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::domain::entities::user::{Group, NewUser, User};
use crate::domain::repositories::error::{RepositoryError, Result};
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::database::connection::DatabaseManager;

const USER_COLUMNS: &str =
    "u.id, u.username, u.first_name, u.last_name, u.email, u.receive_email_on_add_voting_comment";

#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    db: DatabaseManager,
}

impl SqliteUserRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            receive_email_on_add_voting_comment: row.get::<_, i64>(5)? != 0,
        })
    }

    fn group_id_or_create(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO auth_groups (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        conn.query_row(
            "SELECT id FROM auth_groups WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_group(&self, name: &str) -> Result<Group> {
        let name = name.to_string();
        let group = self
            .db
            .execute_blocking(move |conn| {
                conn.execute("INSERT INTO auth_groups (name) VALUES (?1)", params![name])?;
                Ok(Group {
                    id: conn.last_insert_rowid(),
                    name,
                })
            })
            .await?;
        Ok(group)
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let name = name.to_string();
        let group = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT id, name FROM auth_groups WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(Group {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()
            })
            .await?;
        Ok(group)
    }

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>> {
        let group = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT id, name FROM auth_groups WHERE id = ?1",
                    params![group_id],
                    |row| {
                        Ok(Group {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()
            })
            .await?;
        Ok(group)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        if user.username.trim().is_empty() {
            return Err(RepositoryError::InvalidData("Username cannot be empty".into()));
        }

        let new_user = user.clone();
        let created = self
            .db
            .execute_blocking(move |conn| {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT INTO users (username, first_name, last_name, email, receive_email_on_add_voting_comment)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        new_user.username,
                        new_user.first_name,
                        new_user.last_name,
                        new_user.email,
                        new_user.receive_email_on_add_voting_comment as i64
                    ],
                )?;
                let user_id = tx.last_insert_rowid();

                for group in &new_user.groups {
                    let group_id = Self::group_id_or_create(&tx, group)?;
                    tx.execute(
                        "INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
                        params![user_id, group_id],
                    )?;
                }
                tx.commit()?;

                Ok(User {
                    id: user_id,
                    username: new_user.username,
                    first_name: new_user.first_name,
                    last_name: new_user.last_name,
                    email: new_user.email,
                    receive_email_on_add_voting_comment: new_user
                        .receive_email_on_add_voting_comment,
                })
            })
            .await?;
        Ok(created)
    }

    async fn get(&self, user_id: i64) -> Result<Option<User>> {
        let user = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users u WHERE u.id = ?1", USER_COLUMNS),
                    params![user_id],
                    Self::row_to_user,
                )
                .optional()
            })
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        let user = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users u WHERE u.username = ?1", USER_COLUMNS),
                    params![username],
                    Self::row_to_user,
                )
                .optional()
            })
            .await?;
        Ok(user)
    }

    async fn members_of_group(&self, group_id: i64) -> Result<Vec<User>> {
        let users = self
            .db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM users u
                     JOIN user_groups ug ON ug.user_id = u.id
                     WHERE ug.group_id = ?1
                     ORDER BY u.id",
                    USER_COLUMNS
                ))?;
                let rows = stmt.query_map(params![group_id], Self::row_to_user)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await?;
        Ok(users)
    }

    async fn is_member(&self, user_id: i64, group_id: i64) -> Result<bool> {
        let member = self
            .db
            .execute_blocking(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM user_groups WHERE user_id = ?1 AND group_id = ?2)",
                    params![user_id, group_id],
                    |row| row.get::<_, bool>(0),
                )
            })
            .await?;
        Ok(member)
    }

    async fn set_comment_notifications(&self, user_id: i64, enabled: bool) -> Result<()> {
        let affected = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE users SET receive_email_on_add_voting_comment = ?1 WHERE id = ?2",
                    params![enabled as i64, user_id],
                )
            })
            .await?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
