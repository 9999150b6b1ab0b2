//! Core contracts and helpers for pgcensus.
//!
//! This crate defines the table inventory report model, its display
//! sentinels, the shared error type, and helpers used by the introspection,
//! rendering and CLI crates.

pub mod error;
pub mod model;
pub mod redaction;
pub mod validation;

pub use error::{Error, Result};
pub use model::{
    ACCESS_DENIED, ColumnDescriptor, ERROR_LABELS, GeometryColumn, KeyColumns, KeyKind,
    KeyMembership, NO_COMMENT, NO_GEOMETRY, NO_GEOMETRY_TYPE, NO_KEY, NOT_APPLICABLE, Report,
    TABLE_NOT_FOUND, TRANSACTION_ERROR, TableCounts, TableDescriptor, TableIdentity, TableKeys,
    TableReport,
};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use validation::validate_report;

/// Version of the `report.json` artifact layout.
pub const REPORT_VERSION: &str = "0.1";
