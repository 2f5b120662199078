//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use rusqlite::ErrorCode;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Input errors (fatal for a single owner/day group)
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid owner id: {0:?}")]
    InvalidOwner(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid event type: {0}")]
    InvalidEventType(String),

    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            AppError::Db(e) => e.sqlite_error_code(),
            _ => None,
        }
    }

    /// Busy/locked store: worth retrying after a short pause.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.sqlite_code(),
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
        )
    }

    /// An optional relation or column is not present in this deployment.
    pub fn is_schema_absence(&self) -> bool {
        match self {
            AppError::Db(rusqlite::Error::SqliteFailure(_, Some(msg))) => {
                msg.contains("no such table") || msg.contains("no such column")
            }
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Db(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
                    && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
            }
            _ => false,
        }
    }

    /// Malformed input that aborts only the group it belongs to.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            AppError::InvalidDate(_)
                | AppError::InvalidOwner(_)
                | AppError::InvalidTimezone(_)
                | AppError::InvalidEventType(_)
                | AppError::InvalidJobName(_)
                | AppError::InvalidTimestamp(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
