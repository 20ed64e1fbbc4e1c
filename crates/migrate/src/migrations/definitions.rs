//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the types shared by the naming step, the file manager, the
//! history store and the runners.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder substituted with the table name in generated templates
pub const TABLE_PLACEHOLDER: &str = "tb_name";

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Table name for tracking migrations
    pub migrations_table: String,
}

impl MigrationConfig {
    /// Configuration for a migrations directory with the default table name
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            ..Self::default()
        }
    }

    /// Override the history table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            migrations_table: "migrations".to_string(),
        }
    }
}

/// What a migration name says the migration is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationIntent {
    /// Anything that is not `create_<table>_table` or `alter_<table>_table`
    Generic,
    /// `create_<table>_table`
    CreateTable,
    /// `alter_<table>_table`
    AlterTable,
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationDirection {
    /// Apply the migration (run the `.up.sql` file)
    Up,
    /// Rollback the migration (run the `.down.sql` file)
    Down,
}

impl MigrationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationDirection::Up => "up",
            MigrationDirection::Down => "down",
        }
    }

    /// File name suffix for this direction, e.g. `.up.sql`
    pub fn suffix(&self) -> &'static str {
        match self {
            MigrationDirection::Up => ".up.sql",
            MigrationDirection::Down => ".down.sql",
        }
    }
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A migration file discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Migration key: file name without the `.<direction>.sql` suffix
    pub key: String,
    /// Full path to the file
    pub path: PathBuf,
}

/// A row of the history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Surrogate key, insertion order
    pub id: i64,
    /// Migration key
    pub migration: String,
    /// Batch number (for grouping migrations)
    pub batch: i64,
}

/// Files written by the skeleton generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    pub up_file: PathBuf,
    pub down_file: PathBuf,
}

/// Result of running migrations
#[derive(Debug, Clone, Default)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// Keys of migrations that were applied, in order
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Batch the applied migrations were recorded under, if any
    pub batch: Option<i64>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    pub fn is_up_to_date(&self) -> bool {
        self.applied_count == 0
    }
}

/// Result of rolling back migrations
#[derive(Debug, Clone, Default)]
pub struct RollbackResult {
    /// Number of migrations that were rolled back
    pub rolled_back_count: usize,
    /// Keys of migrations that were rolled back, in rollback order
    pub rolled_back_migrations: Vec<String>,
    /// Batch that was rolled back; the last one for `reset`
    pub batch: Option<i64>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Migration status in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied {
        /// Batch number
        batch: i64,
    },
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStatus::Pending => f.write_str("pending"),
            MigrationStatus::Applied { batch } => write!(f, "applied (batch {})", batch),
        }
    }
}
