//! Migration Manager - File system operations for migrations
//!
//! Handles writing skeleton migration pairs and discovering and reading
//! migration files from the migrations directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::definitions::{
    CreatedMigration, MigrationConfig, MigrationDirection, MigrationFile, MigrationIntent,
    TABLE_PLACEHOLDER,
};
use super::naming::{migration_key, MigrationName};
use crate::error::{MigrationError, MigrationResult};

const CREATE_TABLE_TEMPLATE: &str = "CREATE TABLE IF NOT EXISTS tb_name (\n    \
                                         id INTEGER PRIMARY KEY AUTOINCREMENT\n\
                                     )\n";
const ALTER_TABLE_TEMPLATE: &str = "ALTER TABLE tb_name";
const DROP_TABLE_TEMPLATE: &str = "DROP TABLE IF EXISTS tb_name";

/// Migration manager for creating and loading migration files
#[derive(Debug, Clone)]
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Path of a file inside the migrations directory
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.config.migrations_dir.join(file_name)
    }

    /// Write the up/down pair for `name`, pre-filled from its intent.
    ///
    /// Existing files are truncated. The migrations directory must exist.
    pub fn create_migration(&self, name: &MigrationName) -> MigrationResult<CreatedMigration> {
        let up_file = self.create_file(name, MigrationDirection::Up)?;
        tracing::info!("created migration {}", name.up_file());

        let down_file = self.create_file(name, MigrationDirection::Down)?;
        tracing::info!("created migration {}", name.down_file());

        Ok(CreatedMigration { up_file, down_file })
    }

    fn create_file(
        &self,
        name: &MigrationName,
        direction: MigrationDirection,
    ) -> MigrationResult<PathBuf> {
        let path = self.path_for(name.file_name(direction));
        let mut file = File::create(&path).map_err(|e| MigrationError::io(&path, e))?;

        let sql = Self::template_sql(name, direction);
        if !sql.is_empty() {
            file.write_all(sql.as_bytes())
                .map_err(|e| MigrationError::io(&path, e))?;
        }

        Ok(path)
    }

    /// Template text for one side of the pair, with the table name filled in
    pub fn template_sql(name: &MigrationName, direction: MigrationDirection) -> String {
        let template = match (name.intent(), direction) {
            (MigrationIntent::CreateTable, MigrationDirection::Up) => CREATE_TABLE_TEMPLATE,
            (MigrationIntent::CreateTable, MigrationDirection::Down) => DROP_TABLE_TEMPLATE,
            (MigrationIntent::AlterTable, _) => ALTER_TABLE_TEMPLATE,
            (MigrationIntent::Generic, _) => return String::new(),
        };

        template.replacen(TABLE_PLACEHOLDER, name.table_name(), 1)
    }

    /// Discover every migration file for `direction`, sorted by file name.
    ///
    /// The timestamp prefix makes name order the creation order.
    pub fn discover(&self, direction: MigrationDirection) -> MigrationResult<Vec<MigrationFile>> {
        let dir = &self.config.migrations_dir;
        let entries = fs::read_dir(dir).map_err(|e| MigrationError::io(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let key = match path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| migration_key(name, direction))
            {
                Some(key) => key.to_string(),
                None => continue,
            };

            files.push(MigrationFile { key, path });
        }

        files.sort_by(|a, b| a.key.cmp(&b.key));
        tracing::debug!(
            "discovered {} {} migration(s) in {}",
            files.len(),
            direction,
            dir.display()
        );
        Ok(files)
    }

    /// File for `key` in `direction`, if it exists on disk
    pub fn find(&self, key: &str, direction: MigrationDirection) -> Option<MigrationFile> {
        let path = self.path_for(&format!("{}{}", key, direction.suffix()));
        path.is_file().then(|| MigrationFile {
            key: key.to_string(),
            path,
        })
    }

    /// Read a migration file's SQL text
    pub fn read_sql(&self, path: &Path) -> MigrationResult<String> {
        fs::read_to_string(path).map_err(|e| MigrationError::io(path, e))
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TS: &str = "20240101000000";

    fn manager_in(dir: &TempDir) -> MigrationManager {
        MigrationManager::with_config(MigrationConfig::new(dir.path()))
    }

    #[test]
    fn test_create_table_templates() {
        let name = MigrationName::parse(TS, "create_widgets_table").unwrap();
        let up = MigrationManager::template_sql(&name, MigrationDirection::Up);
        let down = MigrationManager::template_sql(&name, MigrationDirection::Down);

        assert!(up.contains("CREATE TABLE IF NOT EXISTS widgets"));
        assert!(up.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert_eq!(down, "DROP TABLE IF EXISTS widgets");
    }

    #[test]
    fn test_alter_table_templates() {
        let name = MigrationName::parse(TS, "alter_widgets_table").unwrap();
        assert_eq!(
            MigrationManager::template_sql(&name, MigrationDirection::Up),
            "ALTER TABLE widgets"
        );
        assert_eq!(
            MigrationManager::template_sql(&name, MigrationDirection::Down),
            "ALTER TABLE widgets"
        );
    }

    #[test]
    fn test_create_migration_writes_pair() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let name = MigrationName::parse(TS, "create_widgets_table").unwrap();

        let created = manager.create_migration(&name).unwrap();
        assert_eq!(
            created.up_file,
            temp_dir.path().join("20240101000000_create_widgets_table.up.sql")
        );

        let up = fs::read_to_string(&created.up_file).unwrap();
        let down = fs::read_to_string(&created.down_file).unwrap();
        assert!(up.contains("CREATE TABLE IF NOT EXISTS widgets"));
        assert!(down.contains("DROP TABLE IF EXISTS widgets"));
    }

    #[test]
    fn test_generic_migration_files_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let name = MigrationName::parse(TS, "add_index_to_widgets").unwrap();

        let created = manager.create_migration(&name).unwrap();
        assert_eq!(fs::read_to_string(&created.up_file).unwrap(), "");
        assert_eq!(fs::read_to_string(&created.down_file).unwrap(), "");
    }

    #[test]
    fn test_create_migration_truncates_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let name = MigrationName::parse(TS, "alter_widgets_table").unwrap();
        fs::write(temp_dir.path().join(name.up_file()), "SELECT 1; -- a much longer body").unwrap();

        let created = manager.create_migration(&name).unwrap();
        assert_eq!(fs::read_to_string(created.up_file).unwrap(), "ALTER TABLE widgets");
    }

    #[test]
    fn test_create_migration_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let manager =
            MigrationManager::with_config(MigrationConfig::new(temp_dir.path().join("missing")));
        let name = MigrationName::parse(TS, "create_widgets_table").unwrap();

        let err = manager.create_migration(&name).unwrap_err();
        assert!(matches!(err, MigrationError::Io { .. }));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        for file in [
            "20240102000000_b.up.sql",
            "20240102000000_b.down.sql",
            "20240101000000_a.up.sql",
            "20240101000000_a.down.sql",
            "notes.txt",
        ] {
            fs::write(temp_dir.path().join(file), "").unwrap();
        }
        fs::create_dir(temp_dir.path().join("20240103000000_dir.up.sql")).unwrap();

        let manager = manager_in(&temp_dir);
        let up: Vec<String> = manager
            .discover(MigrationDirection::Up)
            .unwrap()
            .into_iter()
            .map(|f| f.key)
            .collect();
        assert_eq!(up, vec!["20240101000000_a", "20240102000000_b"]);

        let down = manager.discover(MigrationDirection::Down).unwrap();
        assert_eq!(down.len(), 2);
        assert!(down[0].path.ends_with("20240101000000_a.down.sql"));
    }

    #[test]
    fn test_find_down_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("20240101000000_a.down.sql"), "").unwrap();
        let manager = manager_in(&temp_dir);

        assert!(manager.find("20240101000000_a", MigrationDirection::Down).is_some());
        assert!(manager.find("20240101000000_a", MigrationDirection::Up).is_none());
    }
}
