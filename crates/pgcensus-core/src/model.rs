use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Placeholder for a table without a candidate geometry column.
pub const NO_GEOMETRY: &str = "no geometry";
/// Placeholder for a table whose candidate column is not a `geometry`.
pub const NO_GEOMETRY_TYPE: &str = "no geometry type";
/// Placeholder for an empty key set or a column outside a key.
pub const NO_KEY: &str = "none";
/// Placeholder for a column without a comment.
pub const NO_COMMENT: &str = "none";
/// Placeholder for `columns_number` when the row count failed.
pub const NOT_APPLICABLE: &str = "not applicable";

pub const TABLE_NOT_FOUND: &str = "Table Not Found";
pub const ACCESS_DENIED: &str = "Access Denied/Not a Table";
pub const TRANSACTION_ERROR: &str = "Transaction Error";

/// The only strings `records_number` may hold besides a count.
pub const ERROR_LABELS: [&str; 3] = [TABLE_NOT_FOUND, ACCESS_DENIED, TRANSACTION_ERROR];

/// `(schema, table)` pair identifying a relation in the scanned schemas.
///
/// Ordering is lexicographic on the schema name, then the table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableIdentity {
    pub schema_name: String,
    pub class_name: String,
}

impl TableIdentity {
    pub fn new(schema_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            class_name: class_name.into(),
        }
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.class_name)
    }
}

/// Kind of structural constraint reported per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Primary,
    Unique,
    Foreign,
}

impl KeyKind {
    pub const ALL: [KeyKind; 3] = [KeyKind::Primary, KeyKind::Unique, KeyKind::Foreign];
}

/// Column names taking part in constraints of one kind.
///
/// Keeps first-seen order and ignores repeats, so a column shared by two
/// constraints of the same kind is listed once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyColumns(Vec<String>);

impl KeyColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; returns `false` if it was already present.
    pub fn insert(&mut self, column: impl Into<String>) -> bool {
        let column = column.into();
        if self.contains(&column) {
            return false;
        }
        self.0.push(column);
        true
    }

    /// Exact name match, never a substring match.
    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|item| item == column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined names, or [`NO_KEY`] when empty.
    pub fn display(&self) -> String {
        if self.0.is_empty() {
            NO_KEY.to_string()
        } else {
            self.0.join(", ")
        }
    }
}

impl<S: Into<String>> FromIterator<S> for KeyColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut columns = KeyColumns::new();
        for column in iter {
            columns.insert(column);
        }
        columns
    }
}

/// Resolved primary, unique and foreign key columns of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableKeys {
    pub primary_key: KeyColumns,
    pub unique_key: KeyColumns,
    pub foreign_key: KeyColumns,
}

impl TableKeys {
    pub fn columns(&self, kind: KeyKind) -> &KeyColumns {
        match kind {
            KeyKind::Primary => &self.primary_key,
            KeyKind::Unique => &self.unique_key,
            KeyKind::Foreign => &self.foreign_key,
        }
    }

    pub fn columns_mut(&mut self, kind: KeyKind) -> &mut KeyColumns {
        match kind {
            KeyKind::Primary => &mut self.primary_key,
            KeyKind::Unique => &mut self.unique_key,
            KeyKind::Foreign => &mut self.foreign_key,
        }
    }

    /// Membership of `column` in each key set.
    pub fn membership(&self, column: &str) -> KeyMembership {
        KeyMembership {
            primary: self.primary_key.contains(column),
            unique: self.unique_key.contains(column),
            foreign: self.foreign_key.contains(column),
        }
    }
}

/// First candidate geometry column of a table and its formatted type.
///
/// The type is only ever present together with the field; a field whose
/// declared type is not `geometry` keeps its name but has no type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryColumn {
    field: Option<String>,
    geom_type: Option<String>,
}

impl GeometryColumn {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(field: Option<String>, geom_type: Option<String>) -> Self {
        let geom_type = if field.is_some() { geom_type } else { None };
        Self { field, geom_type }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn geom_type(&self) -> Option<&str> {
        self.geom_type.as_deref()
    }

    pub fn has_geometry(&self) -> bool {
        self.field.is_some()
    }

    pub fn field_label(&self) -> &str {
        self.field.as_deref().unwrap_or(NO_GEOMETRY)
    }

    pub fn type_label(&self) -> &str {
        self.geom_type.as_deref().unwrap_or(NO_GEOMETRY_TYPE)
    }
}

/// Terminal state of the per-table probe.
///
/// Only a counted table has a column count, which is what keeps
/// `columns_number` "not applicable" exactly when `records_number` is an
/// error label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableCounts {
    Counted { records: u64, columns: u64 },
    NotFound,
    AccessDenied,
    TransactionError,
}

impl TableCounts {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Counted { .. })
    }

    pub fn records(&self) -> Option<u64> {
        match self {
            Self::Counted { records, .. } => Some(*records),
            _ => None,
        }
    }

    pub fn columns(&self) -> Option<u64> {
        match self {
            Self::Counted { columns, .. } => Some(*columns),
            _ => None,
        }
    }

    /// Fixed label for the failed states.
    pub fn error_label(&self) -> Option<&'static str> {
        match self {
            Self::Counted { .. } => None,
            Self::NotFound => Some(TABLE_NOT_FOUND),
            Self::AccessDenied => Some(ACCESS_DENIED),
            Self::TransactionError => Some(TRANSACTION_ERROR),
        }
    }

    pub fn records_label(&self) -> String {
        match self {
            Self::Counted { records, .. } => records.to_string(),
            other => other.error_label().unwrap_or_default().to_string(),
        }
    }

    pub fn columns_label(&self) -> String {
        match self {
            Self::Counted { columns, .. } => columns.to_string(),
            _ => NOT_APPLICABLE.to_string(),
        }
    }
}

/// One summary record per scanned table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub identity: TableIdentity,
    pub schema_description: Option<String>,
    pub class_description: Option<String>,
    pub geometry: GeometryColumn,
    pub keys: TableKeys,
    pub counts: TableCounts,
}

/// Which key sets a column belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMembership {
    pub primary: bool,
    pub unique: bool,
    pub foreign: bool,
}

impl KeyMembership {
    pub fn contains(&self, kind: KeyKind) -> bool {
        match kind {
            KeyKind::Primary => self.primary,
            KeyKind::Unique => self.unique,
            KeyKind::Foreign => self.foreign,
        }
    }
}

/// One detail record per column of a scanned table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub comment: Option<String>,
    pub membership: KeyMembership,
}

impl ColumnDescriptor {
    /// Build a column record, deriving key membership from the owning table.
    pub fn new(
        name: String,
        data_type: String,
        nullable: bool,
        comment: Option<String>,
        keys: &TableKeys,
    ) -> Self {
        let membership = keys.membership(&name);
        Self {
            name,
            data_type,
            nullable,
            comment,
            membership,
        }
    }

    /// Column name when it is part of a `kind` key, [`NO_KEY`] otherwise.
    pub fn key_flag(&self, kind: KeyKind) -> &str {
        if self.membership.contains(kind) {
            &self.name
        } else {
            NO_KEY
        }
    }

    pub fn comment_label(&self) -> &str {
        self.comment.as_deref().unwrap_or(NO_COMMENT)
    }
}

/// A table together with its column details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub descriptor: TableDescriptor,
    pub columns: Vec<ColumnDescriptor>,
}

/// Complete result of one scan, sorted by table identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub database: String,
    pub generated_at: DateTime<Local>,
    pub tables: Vec<TableReport>,
}

impl Report {
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    pub fn failed_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|table| table.descriptor.counts.is_error())
            .count()
    }

    pub fn geometry_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|table| table.descriptor.geometry.has_geometry())
            .count()
    }
}
