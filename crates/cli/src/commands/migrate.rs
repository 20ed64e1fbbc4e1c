use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use sluice_migrate::{MigrationManager, MigrationName, MigrationStatus, Migrator, TIMESTAMP_FORMAT};

use crate::config::CliConfig;

/// Open the configured database, creating the file if needed
async fn connect(config: &CliConfig) -> anyhow::Result<SqlitePool> {
    let url = config.require_database_url()?;
    tracing::debug!("connecting to {}", url);
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

async fn migrator(config: &CliConfig) -> anyhow::Result<Migrator> {
    let pool = connect(config).await?;
    let migrator = Migrator::new(pool, config.migration_config())
        .await
        .context("Failed to prepare migration history table")?;
    Ok(migrator)
}

/// Write a new up/down migration pair. Does not touch the database.
pub fn make(config: &CliConfig, name: &str) -> anyhow::Result<()> {
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let name = MigrationName::parse(&timestamp, name)?;

    let manager = MigrationManager::with_config(config.migration_config());
    manager.create_migration(&name)?;

    println!("Created migration {}", name.up_file());
    println!("Created migration {}", name.down_file());
    Ok(())
}

pub async fn up(config: &CliConfig) -> anyhow::Result<()> {
    let result = migrator(config).await?.up().await?;

    if result.is_up_to_date() {
        println!("Everything is up to date");
        return Ok(());
    }

    for key in &result.applied_migrations {
        println!("Migrated {}", key);
    }
    println!(
        "Applied {} migration(s) in batch {} ({} ms)",
        result.applied_count,
        result.batch.unwrap_or_default(),
        result.execution_time_ms
    );
    Ok(())
}

pub async fn down(config: &CliConfig) -> anyhow::Result<()> {
    let result = migrator(config).await?.down().await?;

    if result.rolled_back_count == 0 {
        println!("Nothing to roll back");
        return Ok(());
    }

    for key in &result.rolled_back_migrations {
        println!("Rolled back {}", key);
    }
    println!(
        "Rolled back batch {} ({} ms)",
        result.batch.unwrap_or_default(),
        result.execution_time_ms
    );
    Ok(())
}

pub async fn reset(config: &CliConfig) -> anyhow::Result<()> {
    let result = migrator(config).await?.reset().await?;

    for key in &result.rolled_back_migrations {
        println!("Rolled back {}", key);
    }
    println!("Rolled back {} migration(s)", result.rolled_back_count);
    Ok(())
}

#[derive(Serialize)]
struct StatusEntry {
    migration: String,
    #[serde(flatten)]
    status: MigrationStatus,
}

pub async fn status(config: &CliConfig, json: bool) -> anyhow::Result<()> {
    let statuses = migrator(config).await?.status().await?;

    if json {
        let entries: Vec<StatusEntry> = statuses
            .into_iter()
            .map(|(migration, status)| StatusEntry { migration, status })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No migrations found in {}", config.migrations_dir.display());
        return Ok(());
    }

    println!("Migration Status:");
    println!("================");
    for (migration, status) in &statuses {
        println!("  {:<60} {}", migration, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> CliConfig {
        let migrations_dir = dir.path().join("migrations");
        fs::create_dir(&migrations_dir).unwrap();
        CliConfig {
            database_url: Some(format!("sqlite://{}", dir.path().join("app.db").display())),
            migrations_dir,
            ..Default::default()
        }
    }

    #[test]
    fn test_make_writes_pair_without_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = CliConfig {
            database_url: None,
            ..config_in(&temp_dir)
        };

        make(&config, "create_widgets_table").unwrap();

        let mut files: Vec<String> = fs::read_dir(&config.migrations_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("_create_widgets_table.down.sql"));
        assert!(files[1].ends_with("_create_widgets_table.up.sql"));
    }

    #[test]
    fn test_make_requires_name() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        assert!(make(&config, "").is_err());
    }

    #[tokio::test]
    async fn test_up_status_down_against_file_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        fs::write(
            config.migrations_dir.join("20240101000000_create_widgets_table.up.sql"),
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        )
        .unwrap();
        fs::write(
            config.migrations_dir.join("20240101000000_create_widgets_table.down.sql"),
            "DROP TABLE widgets;",
        )
        .unwrap();

        up(&config).await.unwrap();
        assert!(temp_dir.path().join("app.db").exists());

        let statuses = migrator(&config).await.unwrap().status().await.unwrap();
        assert_eq!(statuses[0].1, MigrationStatus::Applied { batch: 1 });
        status(&config, true).await.unwrap();

        down(&config).await.unwrap();
        let statuses = migrator(&config).await.unwrap().status().await.unwrap();
        assert_eq!(statuses[0].1, MigrationStatus::Pending);
    }

    #[tokio::test]
    async fn test_up_requires_database_url() {
        let temp_dir = TempDir::new().unwrap();
        let config = CliConfig {
            database_url: None,
            ..config_in(&temp_dir)
        };
        assert!(up(&config).await.is_err());
    }
}
