/// Geometry column names checked when none are configured.
pub const DEFAULT_GEOMETRY_COLUMNS: [&str; 2] = ["geom", "wkb_geometry"];

/// Options that control which tables are scanned.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Schemas to enumerate, in configured order.
    pub schemas: Vec<String>,
    /// Candidate geometry column names, in configured order.
    pub geometry_columns: Vec<String>,
}

impl ScanOptions {
    pub fn new(schemas: Vec<String>) -> Self {
        Self {
            schemas,
            ..Self::default()
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            schemas: Vec::new(),
            geometry_columns: DEFAULT_GEOMETRY_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}
