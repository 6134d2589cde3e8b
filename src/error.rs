//! Error types for the schema registry

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Table {table} has no active version")]
    NoActiveVersion { table: String },

    #[error("Version not found: {table} version {version}")]
    VersionNotFound { table: String, version: String },

    #[error("Version already exists: {table} version {version}")]
    VersionExists { table: String, version: String },

    #[error("Invalid table definition for {table}: {reason}")]
    InvalidDefinition { table: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl SchemaError {
    pub(crate) fn table_not_found(table: &str) -> Self {
        Self::TableNotFound { table: table.to_string() }
    }

    pub(crate) fn version_not_found(table: &str, version: &str) -> Self {
        Self::VersionNotFound {
            table: table.to_string(),
            version: version.to_string(),
        }
    }

    /// True for every lookup failure: unknown table, missing active
    /// version, or unknown version id.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchemaError::TableNotFound { .. }
                | SchemaError::NoActiveVersion { .. }
                | SchemaError::VersionNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        assert!(SchemaError::table_not_found("daily log").is_not_found());
        assert!(SchemaError::version_not_found("daily log", "v9").is_not_found());
        assert!(SchemaError::NoActiveVersion { table: "x".into() }.is_not_found());

        let invalid = SchemaError::InvalidDefinition {
            table: "x".into(),
            reason: "bad".into(),
        };
        assert!(!invalid.is_not_found());

        let exists = SchemaError::VersionExists {
            table: "x".into(),
            version: "v1".into(),
        };
        assert!(!exists.is_not_found());
    }

    #[test]
    fn test_messages() {
        let err = SchemaError::version_not_found("behavior scores", "v3");
        assert_eq!(err.to_string(), "Version not found: behavior scores version v3");
    }
}
