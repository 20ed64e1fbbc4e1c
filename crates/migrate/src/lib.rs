//! # sluice-migrate
//!
//! File-based schema migrations for SQLite. A directory of paired
//! `<timestamp>_<name>.up.sql` / `.down.sql` files becomes an ordered
//! history, applied one transaction per file and tracked in a history
//! table inside the database itself.
//!
//! ```no_run
//! use sluice_migrate::{MigrationConfig, Migrator};
//! use sqlx::SqlitePool;
//!
//! # async fn run() -> Result<(), sluice_migrate::MigrationError> {
//! let pool = SqlitePool::connect("sqlite:app.db").await?;
//! let migrator = Migrator::new(pool, MigrationConfig::new("migrations")).await?;
//!
//! let name = migrator.name("create_users_table")?;
//! migrator.create(&name)?;
//!
//! let result = migrator.up().await?;
//! println!("applied {} migration(s)", result.applied_count);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migrations;

pub use error::{MigrationError, MigrationResult};
pub use migrations::*;
