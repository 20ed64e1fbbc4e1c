//! Migration History - the applied-migrations table
//!
//! Owns every statement that touches the history table. Writes take the
//! caller's connection so they commit or roll back together with the
//! migration's own SQL.

use sqlx::{Row, SqliteConnection, SqlitePool};

use super::definitions::MigrationRecord;
use crate::error::MigrationResult;

/// Applied migrations, most recently applied first, with the latest batch
#[derive(Debug, Clone, Default)]
pub struct AppliedMigrations {
    pub records: Vec<MigrationRecord>,
    /// Highest batch number recorded; `0` for an empty table
    pub latest_batch: i64,
}

impl AppliedMigrations {
    pub fn contains(&self, key: &str) -> bool {
        self.records.iter().any(|r| r.migration == key)
    }

    pub fn batch_of(&self, key: &str) -> Option<i64> {
        self.records
            .iter()
            .find(|r| r.migration == key)
            .map(|r| r.batch)
    }
}

/// Access to the history table of one database
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    pool: SqlitePool,
    table: String,
}

impl MigrationHistory {
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the history table if it does not exist yet
    pub async fn ensure_table(&self) -> MigrationResult<()> {
        sqlx::query(&self.create_table_sql())
            .execute(&self.pool)
            .await?;
        tracing::debug!("migration history table {} ready", self.table);
        Ok(())
    }

    /// All applied migrations, most recently applied first
    pub async fn read_records(&self) -> MigrationResult<AppliedMigrations> {
        let rows = sqlx::query(&self.select_records_sql())
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let latest_batch = records.iter().map(|r| r.batch).max().unwrap_or(0);

        Ok(AppliedMigrations {
            records,
            latest_batch,
        })
    }

    /// Records of one batch, most recently applied first
    pub async fn records_in_batch(&self, batch: i64) -> MigrationResult<Vec<MigrationRecord>> {
        let rows = sqlx::query(&self.select_batch_sql())
            .bind(batch)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Record `key` as applied in `batch` on the caller's transaction
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        key: &str,
        batch: i64,
    ) -> MigrationResult<()> {
        sqlx::query(&self.insert_record_sql())
            .bind(key)
            .bind(batch)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Remove one record on the caller's transaction
    pub async fn remove(&self, conn: &mut SqliteConnection, id: i64) -> MigrationResult<()> {
        sqlx::query(&self.delete_record_sql())
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MigrationRecord, sqlx::Error> {
        Ok(MigrationRecord {
            id: row.try_get("id")?,
            migration: row.try_get("migration")?,
            batch: row.try_get("batch")?,
        })
    }

    /// SQL to create the migrations tracking table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
                migration VARCHAR(255) NOT NULL,\n    \
                batch INTEGER NOT NULL\n\
            )",
            self.table
        )
    }

    fn select_records_sql(&self) -> String {
        format!(
            "SELECT id, migration, batch FROM {} ORDER BY id DESC",
            self.table
        )
    }

    fn select_batch_sql(&self) -> String {
        format!(
            "SELECT id, migration, batch FROM {} WHERE batch = ? ORDER BY id DESC",
            self.table
        )
    }

    /// SQL to record a migration as applied
    pub fn insert_record_sql(&self) -> String {
        format!(
            "INSERT INTO {} (migration, batch) VALUES (?, ?)",
            self.table
        )
    }

    fn delete_record_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = ?", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, migration: &str, batch: i64) -> MigrationRecord {
        MigrationRecord {
            id,
            migration: migration.to_string(),
            batch,
        }
    }

    #[test]
    fn test_applied_lookup() {
        let applied = AppliedMigrations {
            records: vec![record(2, "20240102000000_b", 2), record(1, "20240101000000_a", 1)],
            latest_batch: 2,
        };
        assert!(applied.contains("20240101000000_a"));
        assert!(!applied.contains("20240101000000"));
        assert_eq!(applied.batch_of("20240102000000_b"), Some(2));
        assert_eq!(applied.batch_of("missing"), None);
    }

    #[test]
    fn test_empty_history_has_batch_zero() {
        let applied = AppliedMigrations::default();
        assert_eq!(applied.latest_batch, 0);
        assert!(applied.records.is_empty());
    }
}
