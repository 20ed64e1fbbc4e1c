//! Error types for the migration engine
//!
//! Every failure is surfaced to the caller as a single attempt; nothing here
//! is retried.

use std::path::PathBuf;
use thiserror::Error;

use crate::migrations::definitions::MigrationDirection;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The naming step was given an empty name
    #[error("migration name required")]
    NameRequired,

    /// Creating, reading or listing a migration file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Query, transaction or connection failure outside a migration file
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration file's SQL failed; its transaction was rolled back
    #[error("Failed to execute {direction} migration {migration}: {source}")]
    ExecutionFailed {
        migration: String,
        direction: MigrationDirection,
        #[source]
        source: sqlx::Error,
    },

    /// An applied migration has no down file to reverse it with
    #[error("Migration file not found for applied migration: {0}")]
    MissingDownFile(String),
}

impl MigrationError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from a migration file's own SQL
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::ExecutionFailed { .. })
    }
}
