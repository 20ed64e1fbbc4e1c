//! Migration Runner - Executes migrations against the database
//!
//! `Migrator` binds a migrations directory to a database pool. It creates
//! skeleton migration pairs, applies pending migrations and reports status.

use chrono::Utc;
use sqlx::SqlitePool;

use super::definitions::{
    CreatedMigration, MigrationConfig, MigrationDirection, MigrationFile, MigrationRunResult,
    MigrationStatus,
};
use super::history::MigrationHistory;
use super::manager::MigrationManager;
use super::naming::{MigrationName, TIMESTAMP_FORMAT};
use crate::error::{MigrationError, MigrationResult};

/// Migration runner that executes migrations against a database
#[derive(Debug, Clone)]
pub struct Migrator {
    manager: MigrationManager,
    history: MigrationHistory,
    pool: SqlitePool,
    timestamp: String,
}

impl Migrator {
    /// Create a migrator and make sure the history table exists
    pub async fn new(pool: SqlitePool, config: MigrationConfig) -> MigrationResult<Self> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(pool, config, timestamp).await
    }

    /// Like [`Migrator::new`] with a fixed creation timestamp
    pub async fn with_timestamp(
        pool: SqlitePool,
        config: MigrationConfig,
        timestamp: impl Into<String>,
    ) -> MigrationResult<Self> {
        let history = MigrationHistory::new(pool.clone(), config.migrations_table.clone());
        history.ensure_table().await?;

        Ok(Self {
            manager: MigrationManager::with_config(config),
            history,
            pool,
            timestamp: timestamp.into(),
        })
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    pub fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Creation timestamp used to name generated files
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Parse a migration name against this migrator's timestamp
    pub fn name(&self, name: &str) -> MigrationResult<MigrationName> {
        MigrationName::parse(&self.timestamp, name)
    }

    /// Write the skeleton up/down pair for `name`
    pub fn create(&self, name: &MigrationName) -> MigrationResult<CreatedMigration> {
        self.manager.create_migration(name)
    }

    /// Apply every pending migration as one new batch.
    ///
    /// Each file runs in its own transaction together with its history
    /// record. The first failure stops the run; files applied before it
    /// stay committed.
    pub async fn up(&self) -> MigrationResult<MigrationRunResult> {
        let start_time = std::time::Instant::now();

        let candidates = self.manager.discover(MigrationDirection::Up)?;
        let applied = self.history.read_records().await?;

        let pending: Vec<MigrationFile> = candidates
            .into_iter()
            .filter(|file| !applied.contains(&file.key))
            .collect();

        if pending.is_empty() {
            tracing::info!("everything is up to date");
            return Ok(MigrationRunResult {
                skipped_count: applied.records.len(),
                execution_time_ms: start_time.elapsed().as_millis(),
                ..Default::default()
            });
        }

        let batch = applied.latest_batch + 1;
        let mut applied_migrations = Vec::with_capacity(pending.len());

        for file in &pending {
            self.apply(file, batch).await?;
            tracing::info!("migrated {}", file.key);
            applied_migrations.push(file.key.clone());
        }

        Ok(MigrationRunResult {
            applied_count: applied_migrations.len(),
            applied_migrations,
            skipped_count: applied.records.len(),
            batch: Some(batch),
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Apply a single migration file and record it under `batch`
    async fn apply(&self, file: &MigrationFile, batch: i64) -> MigrationResult<()> {
        let sql = self.manager.read_sql(&file.path)?;

        let mut transaction = self.pool.begin().await?;

        if let Err(source) = Self::execute_sql(&mut transaction, &sql).await {
            tracing::warn!("migration {} failed, rolling back", file.key);
            transaction.rollback().await?;
            return Err(MigrationError::ExecutionFailed {
                migration: file.key.clone(),
                direction: MigrationDirection::Up,
                source,
            });
        }

        self.history
            .record(&mut transaction, &file.key, batch)
            .await?;
        transaction.commit().await?;

        Ok(())
    }

    /// Run the body of a migration file; blank files are a no-op
    pub(crate) async fn execute_sql(
        conn: &mut sqlx::SqliteConnection,
        sql: &str,
    ) -> Result<(), sqlx::Error> {
        if sql.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!("executing migration SQL ({} bytes)", sql.len());
        sqlx::raw_sql(sql).execute(conn).await?;
        Ok(())
    }

    /// Status of every migration on disk, in apply order
    pub async fn status(&self) -> MigrationResult<Vec<(String, MigrationStatus)>> {
        let files = self.manager.discover(MigrationDirection::Up)?;
        let applied = self.history.read_records().await?;

        Ok(files
            .into_iter()
            .map(|file| {
                let status = match applied.batch_of(&file.key) {
                    Some(batch) => MigrationStatus::Applied { batch },
                    None => MigrationStatus::Pending,
                };
                (file.key, status)
            })
            .collect())
    }
}
