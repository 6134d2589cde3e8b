//! Schema versioning
//!
//! Each table owns an append-only set of versions and a pointer to the one
//! that is currently active. Version ids are opaque strings; ordering comes
//! from creation, not from parsing the id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::schema::Schema;

/// Opaque version identifier (e.g., "v1", "2024-spring")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VersionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stored schema version with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: VersionId,
    pub schema: Schema,
    /// When this version was registered
    pub created_at: DateTime<Utc>,
    /// Version this one was forked from, if any
    pub forked_from: Option<VersionId>,
    /// Fingerprint of `schema`
    pub checksum: Checksum,
}

impl VersionEntry {
    /// A version supplied at load time
    pub fn new(id: impl Into<VersionId>, schema: Schema) -> Self {
        let checksum = schema.checksum();
        Self {
            id: id.into(),
            schema,
            created_at: Utc::now(),
            forked_from: None,
            checksum,
        }
    }

    /// A version derived from `parent`
    pub fn forked(id: impl Into<VersionId>, schema: Schema, parent: &VersionId) -> Self {
        let mut entry = Self::new(id, schema);
        entry.forked_from = Some(parent.clone());
        entry
    }
}

/// All versions of one table plus its active pointer.
///
/// When `active` is set it always names an entry in `versions`.
#[derive(Debug, Clone, Default)]
pub struct TableVersions {
    versions: Vec<VersionEntry>,
    active: Option<VersionId>,
}

impl TableVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in creation order
    pub fn entries(&self) -> &[VersionEntry] {
        &self.versions
    }

    pub fn ids(&self) -> Vec<&VersionId> {
        self.versions.iter().map(|v| &v.id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_id(&self) -> Option<&VersionId> {
        self.active.as_ref()
    }

    /// The active entry, if a pointer is set
    pub fn active(&self) -> Option<&VersionEntry> {
        self.active.as_ref().and_then(|id| self.get(id.as_str()))
    }

    /// Append an entry. Returns false, storing nothing, if the id is
    /// already taken.
    pub fn insert(&mut self, entry: VersionEntry) -> bool {
        if self.contains(entry.id.as_str()) {
            return false;
        }
        self.versions.push(entry);
        true
    }

    /// Point the table at an existing version. Returns false, leaving the
    /// pointer unchanged, if `id` is not stored.
    pub fn activate(&mut self, id: &str) -> bool {
        match self.get(id) {
            Some(entry) => {
                self.active = Some(entry.id.clone());
                true
            }
            None => false,
        }
    }
}
