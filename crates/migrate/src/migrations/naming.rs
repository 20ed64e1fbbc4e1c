//! Migration naming
//!
//! Turns an operator-supplied name such as `create_users_table` into the
//! file pair it will be written to and the template it gets pre-filled with.

use super::definitions::{MigrationDirection, MigrationIntent};
use crate::error::{MigrationError, MigrationResult};

/// Timestamp format used as the file name prefix (`YYYYMMDDhhmmss`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A parsed migration name, fixed to one timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationName {
    name: String,
    up_file: String,
    down_file: String,
    intent: MigrationIntent,
    table_name: String,
}

impl MigrationName {
    /// Parse `name` into its file pair and intent.
    ///
    /// `<action>_<table>_table` with action `create` or `alter` selects a
    /// table template; the middle segment becomes the table name. Any other
    /// shape is generic and keeps the whole name as the table name.
    pub fn parse(timestamp: &str, name: &str) -> MigrationResult<Self> {
        if name.trim().is_empty() {
            return Err(MigrationError::NameRequired);
        }

        let mut intent = MigrationIntent::Generic;
        let mut table_name = name;

        let segments: Vec<&str> = name.split('_').collect();
        if let [action, table, "table"] = segments.as_slice() {
            intent = match *action {
                "create" => MigrationIntent::CreateTable,
                "alter" => MigrationIntent::AlterTable,
                _ => MigrationIntent::Generic,
            };
            table_name = *table;
        }

        Ok(Self {
            name: name.to_string(),
            up_file: format!("{}_{}{}", timestamp, name, MigrationDirection::Up.suffix()),
            down_file: format!("{}_{}{}", timestamp, name, MigrationDirection::Down.suffix()),
            intent,
            table_name: table_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up_file(&self) -> &str {
        &self.up_file
    }

    pub fn down_file(&self) -> &str {
        &self.down_file
    }

    /// File name for one direction
    pub fn file_name(&self, direction: MigrationDirection) -> &str {
        match direction {
            MigrationDirection::Up => &self.up_file,
            MigrationDirection::Down => &self.down_file,
        }
    }

    pub fn intent(&self) -> MigrationIntent {
        self.intent
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Migration key of a file name: the name minus the exact direction suffix.
///
/// Returns `None` when the file does not belong to `direction` or when
/// nothing would be left of the name.
pub fn migration_key(file_name: &str, direction: MigrationDirection) -> Option<&str> {
    file_name
        .strip_suffix(direction.suffix())
        .filter(|key| !key.is_empty())
}
