use pgcensus_core::{Error, KeyKind, Result, TableIdentity};

use crate::catalog::{CatalogColumn, CatalogTable, ConstraintColumn};

use super::queries::{RawColumn, RawConstraintColumn, RawTable};

/// Convert a driver error, keeping the server SQLSTATE when there is one.
pub fn db_error(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => Error::db_with_state(code.into_owned(), db_err.message()),
            None => Error::db(db_err.message()),
        },
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
            Error::Connection(err.to_string())
        }
        _ => Error::db(err.to_string()),
    }
}

/// Quote an identifier for interpolation into SQL text.
///
/// Wraps the name in double quotes and doubles any embedded quote, which is
/// how PostgreSQL's `quote_ident` escapes names.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert Postgres `contype` code to a key kind.
pub fn key_kind_from_code(code: i8) -> Option<KeyKind> {
    match code as u8 as char {
        'p' => Some(KeyKind::Primary),
        'u' => Some(KeyKind::Unique),
        'f' => Some(KeyKind::Foreign),
        _ => None,
    }
}

pub fn count_from_i64(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::db(format!("negative count returned: {value}")))
}

pub fn map_tables(raw: Vec<RawTable>) -> Vec<CatalogTable> {
    raw.into_iter()
        .map(|table| {
            let geom_type = if table.geom_fieldname.is_some() {
                table.geom_type
            } else {
                None
            };
            CatalogTable {
                identity: TableIdentity::new(table.schema_name, table.class_name),
                schema_description: table.schema_description,
                class_description: table.class_description,
                geom_fieldname: table.geom_fieldname,
                geom_type,
            }
        })
        .collect()
}

pub fn map_constraint_columns(raw: Vec<RawConstraintColumn>) -> Vec<ConstraintColumn> {
    raw.into_iter()
        .filter_map(|row| {
            key_kind_from_code(row.contype).map(|kind| ConstraintColumn {
                kind,
                column: row.column_name,
            })
        })
        .collect()
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<CatalogColumn> {
    raw.into_iter()
        .map(|col| CatalogColumn {
            name: col.name,
            data_type: col.data_type,
            is_nullable: col.is_nullable,
            comment: col.comment,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers_safely() {
        assert_eq!(quote_identifier("roads"), "\"roads\"");
        assert_eq!(quote_identifier("Mixed Case"), "\"Mixed Case\"");
        assert_eq!(
            quote_identifier("x\"; drop table t; --"),
            "\"x\"\"; drop table t; --\""
        );
    }

    #[test]
    fn maps_constraint_codes() {
        assert_eq!(key_kind_from_code(b'p' as i8), Some(KeyKind::Primary));
        assert_eq!(key_kind_from_code(b'u' as i8), Some(KeyKind::Unique));
        assert_eq!(key_kind_from_code(b'f' as i8), Some(KeyKind::Foreign));
        assert_eq!(key_kind_from_code(b'c' as i8), None);
    }

    #[test]
    fn drops_geometry_type_without_field() {
        let tables = map_tables(vec![RawTable {
            schema_name: "s1".to_string(),
            class_name: "t1".to_string(),
            schema_description: None,
            class_description: None,
            geom_fieldname: None,
            geom_type: Some("geometry".to_string()),
        }]);
        assert_eq!(tables[0].identity, TableIdentity::new("s1", "t1"));
        assert!(tables[0].geom_type.is_none());
    }

    #[test]
    fn rejects_negative_counts() {
        assert_eq!(count_from_i64(7).ok(), Some(7));
        assert!(count_from_i64(-1).is_err());
    }
}
