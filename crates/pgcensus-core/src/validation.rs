use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{KeyKind, Report};

/// Validate internal consistency of an assembled report.
///
/// This checks:
/// - duplicate tables and duplicate columns within a table
/// - tables are sorted by schema then table name
/// - a geometry type is only present alongside a geometry field
/// - column key flags agree with the owning table's key sets
pub fn validate_report(report: &Report) -> Result<()> {
    let mut seen = BTreeSet::new();

    for pair in report.tables.windows(2) {
        if pair[0].descriptor.identity > pair[1].descriptor.identity {
            return Err(Error::InvalidReport(format!(
                "tables out of order: {} before {}",
                pair[0].descriptor.identity, pair[1].descriptor.identity
            )));
        }
    }

    for table in &report.tables {
        let descriptor = &table.descriptor;
        if !seen.insert(&descriptor.identity) {
            return Err(Error::InvalidReport(format!(
                "duplicate table: {}",
                descriptor.identity
            )));
        }

        if descriptor.geometry.field().is_none() && descriptor.geometry.geom_type().is_some() {
            return Err(Error::InvalidReport(format!(
                "geometry type without geometry field: {}",
                descriptor.identity
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidReport(format!(
                    "duplicate column name: {}.{}",
                    descriptor.identity, column.name
                )));
            }

            for kind in KeyKind::ALL {
                let expected = descriptor.keys.columns(kind).contains(&column.name);
                if column.membership.contains(kind) != expected {
                    return Err(Error::InvalidReport(format!(
                        "{kind:?} key flag disagrees with table keys: {}.{}",
                        descriptor.identity, column.name
                    )));
                }
            }
        }
    }

    Ok(())
}
