//! Error types for Tally

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A category named '{name}' already exists under {parent}")]
    DuplicateName { name: String, parent: String },

    #[error("Moving category {id} under {new_parent} would create a cycle")]
    Cycle { id: i64, new_parent: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid range: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid report category: {0}")]
    InvalidCategory(i64),

    #[error("Invalid category name: {0}")]
    InvalidName(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failures of the underlying store. These are transient from the core's
/// point of view and are left to the caller to retry.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl Error {
    /// True for store-level failures (connectivity, lock timeouts)
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(e))
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Self::Storage(StorageError::Pool(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_distinct() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("Storage error"));

        let err = Error::NotFound("category 7".to_string());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_duplicate_name_message() {
        let err = Error::DuplicateName {
            name: "Lazer".to_string(),
            parent: "Despesas".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A category named 'Lazer' already exists under Despesas"
        );
    }
}
