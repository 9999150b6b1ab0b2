use chrono::Local;

use pgcensus_core::{
    ColumnDescriptor, GeometryColumn, Report, Result, TableCounts, TableDescriptor, TableIdentity,
    TableReport,
};

use crate::catalog::Catalog;
use crate::constraints::resolve_keys;
use crate::options::ScanOptions;
use crate::probe::probe_table;
use crate::recovery::roll_back_after;

/// Receives progress notifications while a report is assembled.
pub trait ScanObserver {
    /// A table from the catalog is about to be probed (1-based position).
    fn table_started(&mut self, _position: usize, _total: usize, _table: &TableIdentity) {}

    fn table_finished(&mut self, _table: &TableIdentity, _counts: &TableCounts) {}

    /// Column details of a sorted table are about to be read.
    fn columns_started(&mut self, _position: usize, _total: usize, _table: &TableIdentity) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Assemble the full report: summary records sorted by table identity, each
/// with its column records in declared order.
///
/// Fails only when the database name or the table list cannot be read, or
/// when the session is lost. Per-table failures end up in the table's
/// [`TableCounts`].
pub async fn build_report<C>(
    catalog: &mut C,
    opts: &ScanOptions,
    observer: &mut dyn ScanObserver,
) -> Result<Report>
where
    C: Catalog + ?Sized,
{
    let generated_at = Local::now();
    let database = catalog.database_name().await?;
    let tables = catalog.list_tables(opts).await?;
    let total = tables.len();

    tracing::info!(
        event = "catalog_enumerated",
        engine = catalog.engine(),
        database = %database,
        tables = total,
    );

    let mut descriptors = Vec::with_capacity(total);
    for (index, table) in tables.into_iter().enumerate() {
        observer.table_started(index + 1, total, &table.identity);

        let keys = resolve_keys(catalog, &table.identity).await?;
        let counts = probe_table(catalog, &table.identity).await?;

        tracing::debug!(
            event = "table_probed",
            table = %table.identity,
            records_number = %counts.records_label(),
            columns_number = %counts.columns_label(),
        );
        observer.table_finished(&table.identity, &counts);

        descriptors.push(TableDescriptor {
            identity: table.identity,
            schema_description: table.schema_description,
            class_description: table.class_description,
            geometry: GeometryColumn::new(table.geom_fieldname, table.geom_type),
            keys,
            counts,
        });
    }

    descriptors.sort_by(|left, right| left.identity.cmp(&right.identity));

    let mut tables = Vec::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.into_iter().enumerate() {
        observer.columns_started(index + 1, total, &descriptor.identity);
        let columns = describe_columns(catalog, &descriptor).await?;
        tables.push(TableReport {
            descriptor,
            columns,
        });
    }

    Ok(Report {
        database,
        generated_at,
        tables,
    })
}

async fn describe_columns<C>(
    catalog: &mut C,
    descriptor: &TableDescriptor,
) -> Result<Vec<ColumnDescriptor>>
where
    C: Catalog + ?Sized,
{
    let table = &descriptor.identity;
    let relation = match catalog.resolve_relation(table).await {
        Ok(Some(relation)) => relation,
        Ok(None) => {
            tracing::debug!(event = "relation_missing", table = %table, stage = "columns");
            return Ok(Vec::new());
        }
        Err(err) => {
            roll_back_after(catalog, table, "resolve_relation", &err).await?;
            return Ok(Vec::new());
        }
    };

    let columns = match catalog.list_columns(table, relation).await {
        Ok(columns) => columns,
        Err(err) => {
            roll_back_after(catalog, table, "columns", &err).await?;
            return Ok(Vec::new());
        }
    };

    Ok(columns
        .into_iter()
        .map(|column| {
            ColumnDescriptor::new(
                column.name,
                column.data_type,
                column.is_nullable,
                column.comment,
                &descriptor.keys,
            )
        })
        .collect())
}
