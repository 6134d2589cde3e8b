//! Schema types and structures

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// A decoded row: field name to cell value
pub type Record = BTreeMap<String, String>;

/// One column of a table: internal field name and its display header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Internal identifier (e.g., "sleep_hours")
    pub name: String,
    /// Column header as it appears in the sheet (e.g., "Sleep (hrs)")
    pub header: String,
}

impl Field {
    pub fn new(name: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
        }
    }
}

/// Ordered field-to-header mapping for one version of a table.
///
/// Field order is column order. Headers are expected to be unique; the
/// schema does not check this, and a duplicated header makes reverse
/// lookups resolve to whichever field comes last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from `(field, header)` pairs, in column order
    pub fn from_pairs<I, F, H>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, H)>,
        F: Into<String>,
        H: Into<String>,
    {
        let mut schema = Self::new();
        for (name, header) in pairs {
            schema.set_field(name, header);
        }
        schema
    }

    /// Add a field, or relabel it in place if it already exists.
    ///
    /// Returns the previous header when the field was already present.
    pub fn set_field(&mut self, name: impl Into<String>, header: impl Into<String>) -> Option<String> {
        let name = name.into();
        let header = header.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.header, header)),
            None => {
                self.fields.push(Field { name, header });
                None
            }
        }
    }

    /// Header for a field, if the field exists
    pub fn header(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.header.as_str())
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Fields in column order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Header labels in column order
    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.header.clone()).collect()
    }

    /// Reverse lookup from trimmed header to field name
    pub fn header_lookup(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .map(|f| (f.header.trim(), f.name.as_str()))
            .collect()
    }

    /// Decode a row keyed by `headers` into a record.
    ///
    /// Headers are compared after trimming. Unknown headers are skipped, as
    /// are cells that are `None` or past the end of `row`. An empty string
    /// is a value.
    pub fn decode_row<H, V>(&self, headers: &[H], row: &[Option<V>]) -> Record
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let lookup = self.header_lookup();
        let mut record = Record::new();

        for (i, header) in headers.iter().enumerate() {
            let Some(field) = lookup.get(header.as_ref().trim()) else {
                continue;
            };
            if let Some(Some(value)) = row.get(i) {
                record.insert((*field).to_string(), value.as_ref().to_string());
            }
        }

        record
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compute the fingerprint of this schema
    pub fn checksum(&self) -> Checksum {
        Checksum::of_fields(&self.fields)
    }
}

impl<F: Into<String>, H: Into<String>> FromIterator<(F, H)> for Schema {
    fn from_iter<I: IntoIterator<Item = (F, H)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
