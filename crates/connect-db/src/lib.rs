pub mod backend;
pub mod migrations;
pub mod models;
mod policy;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use connect_types::BackendError;
use rusqlite::Connection;
use tracing::info;

pub use backend::LocalBackend;

/// SQLite stand-in for the hosted backend: the same three tables, a small
/// auth-user table, and the same row-level policy.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, BackendError>
    where
        F: FnOnce(&Connection) -> Result<T, BackendError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| BackendError::Storage(format!("DB lock poisoned: {}", e)))?;
        f(&conn)
    }
}

/// Maps SQLite failures onto backend errors; constraint failures are the
/// caller's fault, everything else is storage trouble.
pub(crate) fn storage_error(e: rusqlite::Error) -> BackendError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            BackendError::InvalidRequest(format!(
                "constraint violated: {}",
                msg.unwrap_or_else(|| err.to_string())
            ))
        }
        other => BackendError::Storage(other.to_string()),
    }
}
