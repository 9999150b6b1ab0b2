use async_trait::async_trait;

use pgcensus_core::{KeyKind, Result, TableIdentity};

use crate::options::ScanOptions;

/// Engine-internal identifier of a relation (a Postgres `oid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationId(pub u32);

/// A table as enumerated from the system catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub identity: TableIdentity,
    pub schema_description: Option<String>,
    pub class_description: Option<String>,
    /// First column whose name is a geometry candidate.
    pub geom_fieldname: Option<String>,
    /// Formatted type of that column, only when it is a `geometry`.
    pub geom_type: Option<String>,
}

/// A column taking part in a primary, unique or foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintColumn {
    pub kind: KeyKind,
    pub column: String,
}

/// Column attributes in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub comment: Option<String>,
}

/// Read-only view of a database session used by the scan pipeline.
///
/// Every method runs on the same session and inside the same transaction.
/// After any failed statement the transaction is unusable until
/// [`Catalog::rollback`] is called.
#[async_trait(?Send)]
pub trait Catalog {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Name of the connected database.
    async fn database_name(&mut self) -> Result<String>;

    /// Ordinary and partitioned tables in the configured schemas.
    async fn list_tables(&mut self, opts: &ScanOptions) -> Result<Vec<CatalogTable>>;

    /// Look up the internal identifier of a table, `None` if it is gone.
    async fn resolve_relation(&mut self, table: &TableIdentity) -> Result<Option<RelationId>>;

    /// Primary, unique and foreign key columns of a relation.
    async fn list_constraint_columns(
        &mut self,
        relation: RelationId,
    ) -> Result<Vec<ConstraintColumn>>;

    /// Existence check through the standard information schema.
    async fn table_exists(&mut self, table: &TableIdentity) -> Result<bool>;

    async fn count_rows(&mut self, table: &TableIdentity) -> Result<u64>;

    async fn count_columns(&mut self, table: &TableIdentity) -> Result<u64>;

    async fn list_columns(
        &mut self,
        table: &TableIdentity,
        relation: RelationId,
    ) -> Result<Vec<CatalogColumn>>;

    /// Abandon the current transaction so the session accepts statements again.
    async fn rollback(&mut self) -> Result<()>;
}
