//! Migration System
//!
//! File-based SQL migrations: naming and skeleton generation, discovery,
//! batch application and batch rollback.

pub mod definitions;
pub mod history;
pub mod manager;
pub mod naming;
pub mod rollback;
pub mod runner;

pub use definitions::*;
pub use history::{AppliedMigrations, MigrationHistory};
pub use manager::MigrationManager;
pub use naming::{migration_key, MigrationName, TIMESTAMP_FORMAT};
pub use runner::Migrator;
