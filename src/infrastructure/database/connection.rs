use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::{debug, info};

/// Shared SQLite handle; runs synchronous rusqlite calls on tokio's blocking pool.
#[derive(Clone)]
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// Open (or create) the database file and configure it.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        Self::configure(&connection, true)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Private in-memory database, used by tests and the memory queue backend.
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::configure(&connection, false)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn configure(connection: &Connection, wal: bool) -> Result<()> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        if wal {
            let mode: String =
                connection.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!("SQLite journal mode: {}", mode);
            connection.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }
        Ok(())
    }

    /// Execute a blocking database operation without stalling the async runtime.
    pub async fn execute_blocking<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|e| anyhow!("Database lock poisoned: {}", e))?;
            operation(&conn).map_err(anyhow::Error::from)
        })
        .await
        .context("Failed to execute blocking database operation - task join error")?
    }

    /// Create all tables from schema.sql.
    pub async fn initialize_database(&self) -> Result<()> {
        let schema = include_str!("schema.sql");

        self.execute_blocking(move |connection| connection.execute_batch(schema))
            .await
            .context("Failed to initialize database schema")?;

        info!("Database schema ready");
        Ok(())
    }
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_initializes_twice() {
        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();
        db.initialize_database().await.unwrap();

        let tables: i64 = db
            .execute_blocking(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('polls', 'votes', 'scheduled_jobs')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("voting.db");
        let db = DatabaseManager::new(&path).unwrap();
        db.initialize_database().await.unwrap();
        assert!(path.exists());
    }
}
