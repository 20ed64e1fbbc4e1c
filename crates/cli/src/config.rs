//! Command-line configuration
//!
//! Values come from the environment first and can be overridden by flags.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

use sluice_migrate::MigrationConfig;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Settings shared by every `sluice` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub database_url: Option<String>,
    pub migrations_dir: PathBuf,
    pub migrations_table: String,
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            migrations_dir: PathBuf::from("migrations"),
            migrations_table: "migrations".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.database_url = env::var("DATABASE_URL").ok();

        if let Ok(dir) = env::var("MIGRATIONS_DIR") {
            config.migrations_dir = PathBuf::from(dir);
        }

        if let Ok(table) = env::var("MIGRATIONS_TABLE") {
            config.migrations_table = table;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level.to_lowercase();
        }

        if let Ok(log_format) = env::var("LOG_FORMAT") {
            config.log_format = log_format.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, dir: Option<PathBuf>, database_url: Option<String>) -> Self {
        if let Some(dir) = dir {
            self.migrations_dir = dir;
        }
        if let Some(url) = database_url {
            self.database_url = Some(url);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "log_level",
                &self.log_level,
                format!("one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "log_format",
                &self.log_format,
                format!("one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        // The table name is spliced into SQL, so only plain identifiers pass.
        let table = &self.migrations_table;
        let valid_table = table
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_table {
            return Err(ConfigError::invalid_value(
                "migrations_table",
                table,
                "a plain SQL identifier ([A-Za-z_][A-Za-z0-9_]*)",
            ));
        }

        Ok(())
    }

    /// Database URL, required by every command that touches the database
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or_else(|| {
            ConfigError::missing_required(
                "database_url",
                "Set DATABASE_URL or pass --database-url",
            )
        })
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    pub fn migration_config(&self) -> MigrationConfig {
        MigrationConfig::new(&self.migrations_dir).with_table(&self.migrations_table)
    }
}
