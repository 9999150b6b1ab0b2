use pgcensus_core::{Error, Result, TableCounts, TableIdentity};

use crate::catalog::Catalog;
use crate::recovery::roll_back_after;

/// SQLSTATE `insufficient_privilege`.
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
/// SQLSTATE `wrong_object_type`.
pub const WRONG_OBJECT_TYPE: &str = "42809";
/// SQLSTATE `undefined_table`.
pub const UNDEFINED_TABLE: &str = "42P01";

/// Whether a counting failure means "no access" or "not a countable table".
pub fn is_access_failure(err: &Error) -> bool {
    matches!(
        err.sqlstate(),
        Some(INSUFFICIENT_PRIVILEGE | WRONG_OBJECT_TYPE | UNDEFINED_TABLE)
    )
}

/// Map a counting failure to its terminal probe state.
pub fn classify_failure(err: &Error) -> TableCounts {
    if is_access_failure(err) {
        TableCounts::AccessDenied
    } else {
        TableCounts::TransactionError
    }
}

/// Probe a single table for existence, row count and column count.
///
/// Every per-table failure ends in one of the error states and leaves the
/// session usable for the next table. Only a lost connection or a failed
/// rollback escapes.
pub async fn probe_table<C>(catalog: &mut C, table: &TableIdentity) -> Result<TableCounts>
where
    C: Catalog + ?Sized,
{
    let exists = match catalog.table_exists(table).await {
        Ok(exists) => exists,
        Err(err) => {
            roll_back_after(catalog, table, "exists", &err).await?;
            return Ok(TableCounts::TransactionError);
        }
    };

    if !exists {
        tracing::info!(event = "table_not_found", table = %table);
        return Ok(TableCounts::NotFound);
    }

    match count(catalog, table).await {
        Ok((records, columns)) => Ok(TableCounts::Counted { records, columns }),
        Err(err) => {
            let state = classify_failure(&err);
            roll_back_after(catalog, table, "count", &err).await?;
            Ok(state)
        }
    }
}

async fn count<C>(catalog: &mut C, table: &TableIdentity) -> Result<(u64, u64)>
where
    C: Catalog + ?Sized,
{
    let records = catalog.count_rows(table).await?;
    let columns = catalog.count_columns(table).await?;
    Ok((records, columns))
}
