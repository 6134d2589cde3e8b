//! Schema change notifications
//!
//! The registry announces forks through an optional [`EventSink`]. Hosts
//! plug in whatever pub/sub they run; [`TracingSink`] and
//! [`RecordingSink`] cover logging and tests.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name emitted after a successful fork
pub const SCHEMA_UPDATED: &str = "SCHEMA_UPDATED";

/// Receiver for registry notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// What changed between the old and new version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldChange {
    /// Field added or relabelled
    Added(String),
}

/// Payload of [`SCHEMA_UPDATED`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaUpdated {
    pub table: String,
    /// Version that was active when the fork happened
    pub old_version: String,
    pub new_version: String,
    pub change: FieldChange,
}

impl SchemaUpdated {
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "table": self.table,
            "oldVersion": self.old_version,
            "newVersion": self.new_version,
            "change": self.change,
        })
    }
}

/// Logs every event at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &str, payload: Value) {
        tracing::info!(event = event, %payload, "schema event");
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded `(event, payload)` pairs, oldest first
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &str, payload: Value) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.to_string(), payload));
    }
}
