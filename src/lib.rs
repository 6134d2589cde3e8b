//! Sheet Schema Registry
//!
//! A versioned mapping between internal field names and the column headers
//! of spreadsheet-backed tables, used to encode header rows and decode data
//! rows into records.
//!
//! ## Features
//!
//! - **Versioned Tables**: Each table owns many schema versions and one active pointer
//! - **Lenient Reads**: Rows decode by trimmed header, ignoring unknown columns
//! - **Drift Detection**: Missing and unexpected headers are reported as data
//! - **Additive Forks**: New versions copy the active one and stay inactive until switched
//! - **Change Events**: Forks are announced through an optional event sink
//!
//! ## Lifecycle
//!
//! ```text
//! config ──> [TableDefinition] ──> SchemaRegistry
//!                                   ├── daily log
//!                                   │   ├── v1  (active)
//!                                   │   └── v2  <- add_field forks here
//!                                   └── behavior scores
//!                                       └── v1  (active)
//! ```

pub mod checksum;
pub mod config;
pub mod drift;
pub mod error;
pub mod event;
pub mod registry;
pub mod schema;
pub mod version;

pub use checksum::Checksum;
pub use config::SchemaConfig;
pub use drift::{SchemaChanges, VersionDiff};
pub use error::{Result, SchemaError};
pub use event::{EventSink, RecordingSink, SchemaUpdated, TracingSink, SCHEMA_UPDATED};
pub use registry::{SchemaRegistry, TableDefinition};
pub use schema::{Field, Record, Schema};
pub use version::{VersionEntry, VersionId};
