use async_trait::async_trait;
use sqlx::postgres::types::Oid;
use sqlx::{Connection, PgConnection};

use pgcensus_core::{Error, Result, TableIdentity};

use crate::catalog::{Catalog, CatalogColumn, CatalogTable, ConstraintColumn, RelationId};
use crate::options::ScanOptions;

mod mapper;
mod queries;

pub use mapper::quote_identifier;

/// A single PostgreSQL session scanned inside one read-only transaction.
///
/// The transaction is opened lazily before the first statement and again
/// after every rollback, so one connection serves the whole run.
#[derive(Debug)]
pub struct PostgresCatalog {
    conn: PgConnection,
    in_transaction: bool,
}

impl PostgresCatalog {
    /// Wrap an established connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Open a session from a connection string.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = PgConnection::connect(url)
            .await
            .map_err(|err| Error::Connection(err.to_string()))?;
        Ok(Self::new(conn))
    }

    /// End the transaction and close the connection.
    pub async fn close(mut self) -> Result<()> {
        if self.in_transaction {
            queries::rollback(&mut self.conn).await?;
        }
        self.conn
            .close()
            .await
            .map_err(|err| Error::Connection(err.to_string()))
    }

    async fn session(&mut self) -> Result<&mut PgConnection> {
        if !self.in_transaction {
            queries::begin_read_only(&mut self.conn).await?;
            self.in_transaction = true;
        }
        Ok(&mut self.conn)
    }
}

#[async_trait(?Send)]
impl Catalog for PostgresCatalog {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn database_name(&mut self) -> Result<String> {
        queries::fetch_database_name(self.session().await?).await
    }

    async fn list_tables(&mut self, opts: &ScanOptions) -> Result<Vec<CatalogTable>> {
        let raw =
            queries::list_tables(self.session().await?, &opts.schemas, &opts.geometry_columns)
                .await?;
        Ok(mapper::map_tables(raw))
    }

    async fn resolve_relation(&mut self, table: &TableIdentity) -> Result<Option<RelationId>> {
        let oid = queries::resolve_oid(self.session().await?, table).await?;
        Ok(oid.map(|oid| RelationId(oid.0)))
    }

    async fn list_constraint_columns(
        &mut self,
        relation: RelationId,
    ) -> Result<Vec<ConstraintColumn>> {
        let raw = queries::list_constraint_columns(self.session().await?, Oid(relation.0)).await?;
        Ok(mapper::map_constraint_columns(raw))
    }

    async fn table_exists(&mut self, table: &TableIdentity) -> Result<bool> {
        queries::table_exists(self.session().await?, table).await
    }

    async fn count_rows(&mut self, table: &TableIdentity) -> Result<u64> {
        let count = queries::count_rows(self.session().await?, table).await?;
        mapper::count_from_i64(count)
    }

    async fn count_columns(&mut self, table: &TableIdentity) -> Result<u64> {
        let count = queries::count_columns(self.session().await?, table).await?;
        mapper::count_from_i64(count)
    }

    async fn list_columns(
        &mut self,
        table: &TableIdentity,
        relation: RelationId,
    ) -> Result<Vec<CatalogColumn>> {
        let raw = queries::list_columns(self.session().await?, table, Oid(relation.0)).await?;
        Ok(mapper::map_columns(raw))
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.in_transaction = false;
            queries::rollback(&mut self.conn).await?;
        }
        Ok(())
    }
}
