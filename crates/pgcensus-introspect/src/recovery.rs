use pgcensus_core::{Error, Result, TableIdentity};

use crate::catalog::Catalog;

/// Log a per-table failure and roll the shared transaction back.
///
/// A lost connection is returned as is, without a rollback, and so is a
/// failing rollback: in both cases the run cannot continue.
pub(crate) async fn roll_back_after<C>(
    catalog: &mut C,
    table: &TableIdentity,
    stage: &'static str,
    err: &Error,
) -> Result<()>
where
    C: Catalog + ?Sized,
{
    if let Error::Connection(message) = err {
        tracing::error!(event = "connection_lost", table = %table, stage = stage, error = %err);
        return Err(Error::Connection(message.clone()));
    }

    tracing::warn!(
        event = "rollback",
        table = %table,
        stage = stage,
        sqlstate = err.sqlstate().unwrap_or(""),
        error = %err,
    );
    catalog.rollback().await
}
