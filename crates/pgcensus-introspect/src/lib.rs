//! Table inventory collection for PostgreSQL/PostGIS databases.
//!
//! The [`Catalog`] trait is the seam between the scan pipeline and a live
//! session; [`PostgresCatalog`] implements it over a single `sqlx`
//! connection.

pub mod builder;
pub mod catalog;
pub mod constraints;
pub mod options;
pub mod postgres;
pub mod probe;
mod recovery;

pub use builder::{NoopObserver, ScanObserver, build_report};
pub use catalog::{Catalog, CatalogColumn, CatalogTable, ConstraintColumn, RelationId};
pub use constraints::resolve_keys;
pub use options::{DEFAULT_GEOMETRY_COLUMNS, ScanOptions};
pub use postgres::PostgresCatalog;
pub use probe::{classify_failure, is_access_failure, probe_table};

pub use pgcensus_core::Report;
