use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

use migrations::run_migrations;
pub use models::{HistoryEntry, SentimentRecord};
pub use repositories::DEFAULT_HISTORY_LIMIT;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the on-disk history store.
///
/// Holds only the file path. Every operation opens its own connection through
/// [`Database::execute`] and closes it before returning, so nothing stays open
/// between calls.
#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
}

impl Database {
    /// Create the parent directory if needed and initialize the schema.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let database = Self { db_path };
        database.initialize()?;

        info!("Database initialized at {}", database.path().display());

        Ok(database)
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Ensure the `sentiments` table exists. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        self.execute(|conn| run_migrations(conn).context("failed to run database migrations"))
    }

    /// Run `task` against a freshly opened connection.
    ///
    /// The connection is closed on every exit path: explicitly when the task
    /// succeeds, by drop when it fails.
    pub fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let value = task(&mut conn)?;
        conn.close().map_err(|(_, err)| {
            anyhow::Error::new(err)
                .context(format!("failed to close {}", self.db_path.display()))
        })?;
        Ok(value)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).with_context(|| {
            format!("failed to open SQLite database {}", self.db_path.display())
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("failed to set busy timeout")?;
        Ok(conn)
    }
}
