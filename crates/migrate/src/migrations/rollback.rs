//! Migration Rollback - Handles rolling back applied migrations
//!
//! Reverses whole batches by running each migration's `.down.sql` file,
//! newest first, and removing its history record in the same transaction.

use super::definitions::{MigrationDirection, MigrationRecord, RollbackResult};
use super::runner::Migrator;
use crate::error::{MigrationError, MigrationResult};

impl Migrator {
    /// Rollback the last batch of migrations.
    ///
    /// An empty history is a no-op. The first failure stops the rollback;
    /// migrations reversed before it stay reversed.
    pub async fn down(&self) -> MigrationResult<RollbackResult> {
        let start_time = std::time::Instant::now();

        let latest_batch = self.history().read_records().await?.latest_batch;
        if latest_batch == 0 {
            tracing::info!("nothing to roll back");
            return Ok(RollbackResult {
                execution_time_ms: start_time.elapsed().as_millis(),
                ..Default::default()
            });
        }

        let records = self.history().records_in_batch(latest_batch).await?;
        let mut rolled_back_migrations = Vec::with_capacity(records.len());

        for record in &records {
            self.revert(record).await?;
            tracing::info!("rolled back {}", record.migration);
            rolled_back_migrations.push(record.migration.clone());
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back_migrations.len(),
            rolled_back_migrations,
            batch: Some(latest_batch),
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Rollback every batch, newest first
    pub async fn reset(&self) -> MigrationResult<RollbackResult> {
        let start_time = std::time::Instant::now();
        let mut total = RollbackResult::default();

        loop {
            let result = self.down().await?;
            if result.rolled_back_count == 0 {
                break;
            }
            total.rolled_back_count += result.rolled_back_count;
            total.rolled_back_migrations.extend(result.rolled_back_migrations);
            total.batch = result.batch;
        }

        total.execution_time_ms = start_time.elapsed().as_millis();
        Ok(total)
    }

    /// Run one record's down file and delete the record
    async fn revert(&self, record: &MigrationRecord) -> MigrationResult<()> {
        let file = self
            .manager()
            .find(&record.migration, MigrationDirection::Down)
            .ok_or_else(|| MigrationError::MissingDownFile(record.migration.clone()))?;
        let sql = self.manager().read_sql(&file.path)?;

        let mut transaction = self.pool().begin().await?;

        if let Err(source) = Self::execute_sql(&mut transaction, &sql).await {
            tracing::warn!("rollback of {} failed, rolling back", record.migration);
            transaction.rollback().await?;
            return Err(MigrationError::ExecutionFailed {
                migration: record.migration.clone(),
                direction: MigrationDirection::Down,
                source,
            });
        }

        self.history().remove(&mut transaction, record.id).await?;
        transaction.commit().await?;

        Ok(())
    }
}
