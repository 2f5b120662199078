//! SQLite connection wrapper (one connection per worker).

use crate::config::Config;
use crate::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    /// Open the configured database.
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        Self::open(&cfg.database, cfg.statement_timeout())
    }

    /// `timeout` bounds how long a statement waits for a lock held by
    /// another connection; past it the statement fails with SQLITE_BUSY,
    /// which callers treat as transient. It does not bound execution time:
    /// a statement that already holds its locks runs to completion.
    pub fn open(path: &str, timeout: Duration) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(timeout)?;

        if path != ":memory:" {
            // WAL lets readers proceed while one writer holds the lock.
            let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Ok(Self { conn })
    }
}
