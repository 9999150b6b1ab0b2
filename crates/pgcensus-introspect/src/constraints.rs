use pgcensus_core::{Result, TableIdentity, TableKeys};

use crate::catalog::Catalog;
use crate::recovery::roll_back_after;

/// Resolve the primary, unique and foreign key columns of a table.
///
/// Constraints of the same kind are flattened into one set. A table that
/// can no longer be found, or whose constraints cannot be read, yields empty
/// sets, which render as `none`.
pub async fn resolve_keys<C>(catalog: &mut C, table: &TableIdentity) -> Result<TableKeys>
where
    C: Catalog + ?Sized,
{
    let relation = match catalog.resolve_relation(table).await {
        Ok(Some(relation)) => relation,
        Ok(None) => {
            tracing::debug!(event = "relation_missing", table = %table, stage = "constraints");
            return Ok(TableKeys::default());
        }
        Err(err) => {
            roll_back_after(catalog, table, "resolve_relation", &err).await?;
            return Ok(TableKeys::default());
        }
    };

    let columns = match catalog.list_constraint_columns(relation).await {
        Ok(columns) => columns,
        Err(err) => {
            roll_back_after(catalog, table, "constraints", &err).await?;
            return Ok(TableKeys::default());
        }
    };

    let mut keys = TableKeys::default();
    for entry in columns {
        keys.columns_mut(entry.kind).insert(entry.column);
    }
    Ok(keys)
}
