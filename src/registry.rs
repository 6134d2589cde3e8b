//! Schema Registry
//!
//! Holds every table's versions and active pointer, and translates between
//! sheet rows and records through the active schema.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::drift::{SchemaChanges, VersionDiff};
use crate::error::{Result, SchemaError};
use crate::event::{EventSink, FieldChange, SchemaUpdated, SCHEMA_UPDATED};
use crate::schema::{Record, Schema};
use crate::version::{TableVersions, VersionEntry, VersionId};

/// Initial state of one table, as supplied by configuration
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub table: String,
    /// Versions in the order they should be listed
    pub versions: Vec<(VersionId, Schema)>,
    /// Version to activate; `None` leaves the table without one
    pub active_version: Option<VersionId>,
}

impl TableDefinition {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            versions: Vec::new(),
            active_version: None,
        }
    }

    /// Add a version
    pub fn version(mut self, id: impl Into<VersionId>, schema: Schema) -> Self {
        self.versions.push((id.into(), schema));
        self
    }

    /// Set the initially active version
    pub fn active(mut self, id: impl Into<VersionId>) -> Self {
        self.active_version = Some(id.into());
        self
    }
}

/// The schema registry
pub struct SchemaRegistry {
    tables: HashMap<String, TableVersions>,
    sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("tables", &self.tables)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl SchemaRegistry {
    /// Build a registry from table definitions.
    ///
    /// Fails if a table id repeats or if an active version is named that
    /// the table does not define.
    pub fn new(definitions: impl IntoIterator<Item = TableDefinition>) -> Result<Self> {
        let mut tables = HashMap::new();

        for def in definitions {
            if tables.contains_key(&def.table) {
                return Err(SchemaError::InvalidDefinition {
                    table: def.table,
                    reason: "table defined more than once".to_string(),
                });
            }

            let mut versions = TableVersions::new();
            for (id, schema) in def.versions {
                if !versions.insert(VersionEntry::new(id.clone(), schema)) {
                    return Err(SchemaError::InvalidDefinition {
                        table: def.table,
                        reason: format!("version {} defined more than once", id),
                    });
                }
            }

            if let Some(active) = &def.active_version {
                if !versions.activate(active.as_str()) {
                    return Err(SchemaError::InvalidDefinition {
                        table: def.table,
                        reason: format!("active version {} is not defined", active),
                    });
                }
            }

            debug!(
                table = %def.table,
                versions = versions.entries().len(),
                active = ?def.active_version,
                "loaded table"
            );
            tables.insert(def.table, versions);
        }

        Ok(Self { tables, sink: None })
    }

    /// Attach a sink for [`SCHEMA_UPDATED`] notifications
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Table ids, sorted
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Version ids of a table, in creation order
    pub fn versions(&self, table: &str) -> Result<Vec<&VersionId>> {
        Ok(self.table(table)?.ids())
    }

    /// Stored versions of a table with their metadata
    pub fn entries(&self, table: &str) -> Result<&[VersionEntry]> {
        Ok(self.table(table)?.entries())
    }

    /// Currently active version id, `None` if the table has none
    pub fn active_version(&self, table: &str) -> Result<Option<&VersionId>> {
        Ok(self.table(table)?.active_id())
    }

    /// Active schema of a table
    pub fn get_schema(&self, table: &str) -> Result<&Schema> {
        Ok(&self.active_entry(table)?.schema)
    }

    /// Header row of the active schema, in column order
    pub fn get_headers(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.get_schema(table)?.headers())
    }

    /// Decode a sheet row through the active schema.
    ///
    /// Lenient: unknown headers and absent cells are skipped, never
    /// reported. Use [`Self::detect_schema_changes`] for drift.
    pub fn map_row_to_object<H, V>(&self, table: &str, headers: &[H], row: &[Option<V>]) -> Result<Record>
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(self.get_schema(table)?.decode_row(headers, row))
    }

    /// Compare a sheet's headers with the active schema
    pub fn detect_schema_changes<H: AsRef<str>>(&self, table: &str, headers: &[H]) -> Result<SchemaChanges> {
        let changes = SchemaChanges::detect(self.get_schema(table)?, headers);
        if changes.has_changes {
            debug!(
                table,
                missing = ?changes.missing,
                extra = ?changes.extra,
                "header drift"
            );
        }
        Ok(changes)
    }

    /// Schema of a specific version, active or not
    pub fn schema_at(&self, table: &str, version: &str) -> Result<&Schema> {
        Ok(&self.entry_at(table, version)?.schema)
    }

    /// Header row of a specific version
    pub fn headers_at(&self, table: &str, version: &str) -> Result<Vec<String>> {
        Ok(self.schema_at(table, version)?.headers())
    }

    /// Decode a row written under an older (or newer) version
    pub fn map_row_at<H, V>(
        &self,
        table: &str,
        version: &str,
        headers: &[H],
        row: &[Option<V>],
    ) -> Result<Record>
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(self.schema_at(table, version)?.decode_row(headers, row))
    }

    /// Field-level comparison of two versions of a table
    pub fn diff_versions(&self, table: &str, from: &str, to: &str) -> Result<VersionDiff> {
        let from = self.entry_at(table, from)?;
        let to = self.entry_at(table, to)?;
        Ok(VersionDiff::between(from, to))
    }

    /// Fork the active schema into `new_version` with `field` set to `header`.
    ///
    /// The active pointer does not move; call [`Self::set_version`] to
    /// switch. Stored versions are never replaced: an existing
    /// `new_version` fails with [`SchemaError::VersionExists`] and leaves
    /// the registry unchanged.
    pub fn add_field(&mut self, table: &str, field: &str, header: &str, new_version: &str) -> Result<()> {
        let versions = self
            .tables
            .get_mut(table)
            .ok_or_else(|| SchemaError::table_not_found(table))?;

        if versions.contains(new_version) {
            return Err(SchemaError::VersionExists {
                table: table.to_string(),
                version: new_version.to_string(),
            });
        }

        let active = versions
            .active()
            .ok_or_else(|| SchemaError::NoActiveVersion { table: table.to_string() })?;
        let old_version = active.id.clone();

        let mut schema = active.schema.clone();
        schema.set_field(field, header);
        let entry = VersionEntry::forked(new_version, schema, &old_version);

        versions.insert(entry);

        info!(
            table,
            field,
            header,
            from = %old_version,
            to = new_version,
            "forked schema version"
        );

        if let Some(sink) = &self.sink {
            let update = SchemaUpdated {
                table: table.to_string(),
                old_version: old_version.to_string(),
                new_version: new_version.to_string(),
                change: FieldChange::Added(field.to_string()),
            };
            sink.emit(SCHEMA_UPDATED, update.to_payload());
        }

        Ok(())
    }

    /// Make an existing version the active one
    pub fn set_version(&mut self, table: &str, version: &str) -> Result<()> {
        let versions = self
            .tables
            .get_mut(table)
            .ok_or_else(|| SchemaError::table_not_found(table))?;

        let previous = versions.active_id().cloned();
        if !versions.activate(version) {
            return Err(SchemaError::version_not_found(table, version));
        }

        info!(table, from = ?previous, to = version, "activated schema version");
        Ok(())
    }

    fn table(&self, table: &str) -> Result<&TableVersions> {
        self.tables
            .get(table)
            .ok_or_else(|| SchemaError::table_not_found(table))
    }

    fn active_entry(&self, table: &str) -> Result<&VersionEntry> {
        let entry = self
            .table(table)?
            .active()
            .ok_or_else(|| SchemaError::NoActiveVersion { table: table.to_string() })?;
        debug!(table, version = %entry.id, "resolved active version");
        Ok(entry)
    }

    fn entry_at(&self, table: &str, version: &str) -> Result<&VersionEntry> {
        self.table(table)?
            .get(version)
            .ok_or_else(|| SchemaError::version_not_found(table, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingSink;

    fn daily_log() -> TableDefinition {
        TableDefinition::new("daily log")
            .version("v1", Schema::from_pairs([("date", "Date"), ("mood", "Mood")]))
            .active("v1")
    }

    #[test]
    fn test_create_registry() {
        let registry = SchemaRegistry::new([daily_log()]).unwrap();
        assert_eq!(registry.tables(), vec!["daily log"]);
        assert_eq!(registry.get_headers("daily log").unwrap(), vec!["Date", "Mood"]);
    }

    #[test]
    fn test_active_version_must_exist() {
        let def = TableDefinition::new("t")
            .version("v1", Schema::from_pairs([("a", "A")]))
            .active("v2");
        let err = SchemaRegistry::new([def]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = SchemaRegistry::new([daily_log(), daily_log()]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let def = TableDefinition::new("t")
            .version("v1", Schema::from_pairs([("a", "A")]))
            .version("v1", Schema::from_pairs([("b", "B")]));
        assert!(SchemaRegistry::new([def]).is_err());
    }

    #[test]
    fn test_table_without_active_version() {
        let def = TableDefinition::new("t").version("v1", Schema::from_pairs([("a", "A")]));
        let mut registry = SchemaRegistry::new([def]).unwrap();

        let err = registry.get_schema("t").unwrap_err();
        assert!(matches!(err, SchemaError::NoActiveVersion { .. }));
        assert!(err.is_not_found());

        let err = registry.add_field("t", "b", "B", "v2").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(registry.versions("t").unwrap().len(), 1);

        registry.set_version("t", "v1").unwrap();
        assert_eq!(registry.get_headers("t").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_failed_set_version_keeps_pointer() {
        let mut registry = SchemaRegistry::new([daily_log()]).unwrap();
        assert!(registry.set_version("daily log", "v9").is_err());
        assert_eq!(
            registry.active_version("daily log").unwrap().map(VersionId::as_str),
            Some("v1")
        );
    }

    #[test]
    fn test_fork_onto_existing_version_is_rejected() {
        let sink = Arc::new(RecordingSink::new());
        let mut registry = SchemaRegistry::new([daily_log()])
            .unwrap()
            .with_sink(sink.clone());

        let err = registry.add_field("daily log", "sleep", "Sleep", "v1").unwrap_err();
        assert!(matches!(err, SchemaError::VersionExists { .. }));
        assert!(!err.is_not_found());

        assert_eq!(registry.get_headers("daily log").unwrap(), vec!["Date", "Mood"]);
        assert_eq!(registry.versions("daily log").unwrap().len(), 1);
        assert!(sink.events().is_empty());

        registry.add_field("daily log", "sleep", "Sleep", "v2").unwrap();
        assert!(registry.add_field("daily log", "notes", "Notes", "v2").is_err());
        assert_eq!(
            registry.headers_at("daily log", "v2").unwrap(),
            vec!["Date", "Mood", "Sleep"]
        );
    }

    #[test]
    fn test_fork_records_parent_and_emits() {
        let sink = Arc::new(RecordingSink::new());
        let mut registry = SchemaRegistry::new([daily_log()])
            .unwrap()
            .with_sink(sink.clone());

        registry.add_field("daily log", "mood", "Mood (1-5)", "v2").unwrap();

        let entries = registry.entries("daily log").unwrap();
        assert_eq!(entries[1].forked_from.as_ref().map(VersionId::as_str), Some("v1"));
        assert_eq!(
            registry.headers_at("daily log", "v2").unwrap(),
            vec!["Date", "Mood (1-5)"]
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, SCHEMA_UPDATED);
        assert_eq!(events[0].1["change"]["added"], "mood");
    }

    #[test]
    fn test_failed_fork_emits_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let mut registry = SchemaRegistry::new([daily_log()])
            .unwrap()
            .with_sink(sink.clone());

        assert!(registry.add_field("nope", "a", "A", "v2").is_err());
        assert!(sink.events().is_empty());
    }
}
