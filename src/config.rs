//! Configuration for the schema registry
//!
//! Table schemas live in code or config, never in the sheet. Configuration
//! is layered from:
//! - Config files (sheet-schemas.toml)
//! - The XDG config directory
//! - Environment variables (SHEET_SCHEMAS__*)
//!
//! ## Example config file (sheet-schemas.toml):
//! ```toml
//! [registry]
//! announce_events = true
//!
//! [[tables]]
//! name = "daily log"
//! active_version = "v2"
//!
//! [[tables.versions]]
//! id = "v1"
//! fields = [
//!     { name = "date", header = "Date" },
//!     { name = "mood", header = "Mood" },
//! ]
//!
//! [[tables.versions]]
//! id = "v2"
//! fields = [
//!     { name = "date", header = "Date" },
//!     { name = "mood", header = "Mood" },
//!     { name = "sleep", header = "Sleep (hrs)" },
//! ]
//! ```

use std::path::Path;
use std::sync::Arc;

use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::TracingSink;
use crate::registry::{SchemaRegistry, TableDefinition};
use crate::schema::{Field, Schema};
use crate::version::VersionId;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Table definitions
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Log SCHEMA_UPDATED events through tracing
    #[serde(default = "default_true")]
    pub announce_events: bool,
}

/// One table and its versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version: Option<String>,

    #[serde(default)]
    pub versions: Vec<VersionConfig>,
}

/// One schema version: ordered fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
    pub id: String,

    #[serde(default)]
    pub fields: Vec<Field>,
}

fn default_true() -> bool {
    true
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            announce_events: true,
        }
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "sheet-schemas.toml",
            ".sheet-schemas.toml",
            "config/sheet-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "sheet", "sheet-schemas") {
            let xdg_config = dirs.config_dir().join("sheet-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SHEET_SCHEMAS")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Explicit `(table, versions, active)` definitions, in file order
    pub fn table_definitions(&self) -> Vec<TableDefinition> {
        self.tables
            .iter()
            .map(|table| TableDefinition {
                table: table.name.clone(),
                versions: table
                    .versions
                    .iter()
                    .map(|v| {
                        let schema = v
                            .fields
                            .iter()
                            .map(|f| (f.name.clone(), f.header.clone()))
                            .collect::<Schema>();
                        (VersionId::new(v.id.clone()), schema)
                    })
                    .collect(),
                active_version: table.active_version.clone().map(VersionId::from),
            })
            .collect()
    }

    /// Build a registry, attaching a [`TracingSink`] when events are announced
    pub fn build_registry(&self) -> Result<SchemaRegistry> {
        let registry = SchemaRegistry::new(self.table_definitions())?;
        if self.registry.announce_events {
            Ok(registry.with_sink(Arc::new(TracingSink)))
        } else {
            Ok(registry)
        }
    }
}
