//! Header drift detection and version comparison
//!
//! Drift is data, not an error: a sheet whose headers disagree with the
//! active schema still decodes, and these reports say how far apart the two
//! are.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::version::VersionEntry;

/// Difference between a sheet's actual headers and the expected ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChanges {
    /// Expected headers not found in the sheet, in schema order
    pub missing: Vec<String>,
    /// Sheet headers the schema does not know, untrimmed, in sheet order
    pub extra: Vec<String>,
    pub has_changes: bool,
}

impl SchemaChanges {
    /// Compare `actual` against the headers of `schema`.
    ///
    /// Actual headers are trimmed before comparison; expected headers are
    /// taken as configured. `has_changes` is raised when the distinct
    /// header counts differ or when any actual header is unexpected. With
    /// duplicate headers in the sheet this can disagree with
    /// `missing`/`extra` being empty or not.
    pub fn detect<H: AsRef<str>>(schema: &Schema, actual: &[H]) -> Self {
        let expected: HashSet<&str> = schema.fields().iter().map(|f| f.header.as_str()).collect();
        let actual_set: HashSet<&str> = actual.iter().map(|h| h.as_ref().trim()).collect();

        let missing = schema
            .fields()
            .iter()
            .filter(|f| !actual_set.contains(f.header.as_str()))
            .map(|f| f.header.clone())
            .collect();

        let extra = actual
            .iter()
            .map(|h| h.as_ref())
            .filter(|h| !expected.contains(h.trim()))
            .map(str::to_string)
            .collect();

        let has_changes = actual_set.len() != expected.len()
            || actual_set.iter().any(|h| !expected.contains(h));

        Self {
            missing,
            extra,
            has_changes,
        }
    }
}

/// A field whose header differs between two versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relabel {
    pub field: String,
    pub from: String,
    pub to: String,
}

/// Field-level comparison of two stored versions of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from: String,
    pub to: String,
    /// Fields present only in `to`, in `to` order
    pub added: Vec<String>,
    /// Fields present only in `from`, in `from` order
    pub removed: Vec<String>,
    pub relabelled: Vec<Relabel>,
    /// Same fields, headers and order
    pub identical: bool,
}

impl VersionDiff {
    pub fn between(from: &VersionEntry, to: &VersionEntry) -> Self {
        let added = to
            .schema
            .fields()
            .iter()
            .filter(|f| !from.schema.contains_field(&f.name))
            .map(|f| f.name.clone())
            .collect();

        let removed = from
            .schema
            .fields()
            .iter()
            .filter(|f| !to.schema.contains_field(&f.name))
            .map(|f| f.name.clone())
            .collect();

        let relabelled = from
            .schema
            .fields()
            .iter()
            .filter_map(|old| {
                let new_header = to.schema.header(&old.name)?;
                (new_header != old.header).then(|| Relabel {
                    field: old.name.clone(),
                    from: old.header.clone(),
                    to: new_header.to_string(),
                })
            })
            .collect();

        Self {
            from: from.id.to_string(),
            to: to.id.to_string(),
            added,
            removed,
            relabelled,
            identical: from.checksum == to.checksum,
        }
    }

    /// Only additions: every `from` field survives with its header
    pub fn is_additive(&self) -> bool {
        self.removed.is_empty() && self.relabelled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(pairs: &[(&str, &str)]) -> Schema {
        Schema::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_missing_header() {
        let changes = SchemaChanges::detect(&schema(&[("a", "h1"), ("b", "h2")]), &["h1"]);
        assert_eq!(changes.missing, vec!["h2"]);
        assert!(changes.extra.is_empty());
        assert!(changes.has_changes);
    }

    #[test]
    fn test_extra_header_keeps_original_spelling() {
        let changes = SchemaChanges::detect(&schema(&[("a", "h1")]), &["h1", " h3 "]);
        assert!(changes.missing.is_empty());
        assert_eq!(changes.extra, vec![" h3 "]);
        assert!(changes.has_changes);
    }

    #[test]
    fn test_reordered_headers_are_not_drift() {
        let changes = SchemaChanges::detect(&schema(&[("a", "h1"), ("b", "h2")]), &["h2", " h1"]);
        assert_eq!(changes, SchemaChanges::default());
    }

    #[test]
    fn test_swap_with_equal_counts() {
        let changes = SchemaChanges::detect(&schema(&[("a", "h1"), ("b", "h2")]), &["h1", "h3"]);
        assert_eq!(changes.missing, vec!["h2"]);
        assert_eq!(changes.extra, vec!["h3"]);
        assert!(changes.has_changes);
    }

    #[test]
    fn test_duplicate_actual_headers_collapse() {
        // {h1} vs {h1, h2}: sizes differ, so drift is raised through the count clause.
        let changes = SchemaChanges::detect(&schema(&[("a", "h1"), ("b", "h2")]), &["h1", "h1"]);
        assert_eq!(changes.missing, vec!["h2"]);
        assert!(changes.extra.is_empty());
        assert!(changes.has_changes);

        let changes = SchemaChanges::detect(&schema(&[("a", "h1")]), &["h1", "h1 "]);
        assert!(changes.missing.is_empty());
        assert!(changes.extra.is_empty());
        assert!(!changes.has_changes);
    }

    #[test]
    fn test_version_diff() {
        let v1 = VersionEntry::new("v1", schema(&[("date", "Date"), ("mood", "Mood")]));
        let v2 = VersionEntry::new(
            "v2",
            schema(&[("date", "Date"), ("mood", "Mood (1-5)"), ("sleep", "Sleep")]),
        );

        let diff = VersionDiff::between(&v1, &v2);
        assert_eq!(diff.added, vec!["sleep"]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.relabelled.len(), 1);
        assert_eq!(diff.relabelled[0].to, "Mood (1-5)");
        assert!(!diff.identical);
        assert!(!diff.is_additive());

        let back = VersionDiff::between(&v2, &v1);
        assert_eq!(back.removed, vec!["sleep"]);
    }

    #[test]
    fn test_identical_versions() {
        let v1 = VersionEntry::new("v1", schema(&[("date", "Date")]));
        let v2 = VersionEntry::new("v2", schema(&[("date", "Date")]));
        let diff = VersionDiff::between(&v1, &v2);
        assert!(diff.identical);
        assert!(diff.is_additive());
    }
}
