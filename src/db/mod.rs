//! Persistence gateway for the task board.
//!
//! `Database` owns a single SQLite connection. Callers construct it
//! explicitly and pass it to whatever needs it; every lifecycle operation
//! runs as one immediate transaction on that connection.

pub mod legacy;
pub mod ordering;
pub mod tag_store;
pub mod tasks;

use crate::archive::ArchivePolicy;
use crate::error::TaskResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    archive: ArchivePolicy,
}

impl Database {
    /// Open or create the database at the given path and bring its schema
    /// up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> TaskResult<Self> {
        Self::open_with_report(path).map(|(db, _)| db)
    }

    /// Like [`Database::open`], also returning the migrations it applied.
    pub fn open_with_report<P: AsRef<Path>>(path: P) -> TaskResult<(Self, Vec<String>)> {
        let conn = Connection::open(path.as_ref())?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            archive: ArchivePolicy::default(),
        };

        let applied = db.run_migrations()?;
        debug!(path = %path.as_ref().display(), applied = applied.len(), "Database opened");

        Ok((db, applied))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> TaskResult<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            archive: ArchivePolicy::default(),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Replace the archive policy used by listing and purge operations.
    pub fn with_archive_policy(mut self, policy: ArchivePolicy) -> Self {
        self.archive = policy;
        self
    }

    pub fn archive_policy(&self) -> &ArchivePolicy {
        &self.archive
    }

    /// Adopt a legacy schema if present, then apply pending migrations.
    /// Returns the names of the migrations applied by this call.
    pub fn run_migrations(&self) -> TaskResult<Vec<String>> {
        let mut conn = self.lock();

        let added = legacy::adopt_legacy_schema(&conn)?;
        if !added.is_empty() {
            info!(columns = ?added, "Adopted legacy tasks table");
        }

        let report = embedded::migrations::runner().run(&mut *conn)?;
        let applied: Vec<String> = report
            .applied_migrations()
            .iter()
            .map(|m| format!("V{}__{}", m.version(), m.name()))
            .collect();
        for name in &applied {
            info!(migration = %name, "Applied migration");
        }
        Ok(applied)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> TaskResult<T>
    where
        F: FnOnce(&Connection) -> TaskResult<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside an immediate transaction, committing on success.
    /// Any error drops the transaction, rolling back every write made in `f`.
    pub fn with_tx<F, T>(&self, f: F) -> TaskResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> TaskResult<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Current time truncated to the millisecond precision used in storage.
pub fn now_utc() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now)
}

pub(crate) fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
