/// A single cell as it will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
}

impl CellValue {
    /// Text cell. The literals `"0"` and `"1"` become integer cells; any
    /// other text, numeric-looking or not, stays text.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.as_str() {
            "0" => Self::Integer(0),
            "1" => Self::Integer(1),
            _ => Self::Text(value),
        }
    }

    /// Text cell for a nullable value; `None` leaves the cell empty.
    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, Self::text)
    }

    pub fn count(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }

    /// `1` for true, `0` for false.
    pub fn flag(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Font treatment applied to every cell of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Plain,
    Error,
    Geometry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub cells: Vec<CellValue>,
    pub style: RowStyle,
}

/// One worksheet: a styled header row followed by data rows.
///
/// Every sheet gets an autofilter over its used range and a frozen header.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub title: String,
    pub headers: &'static [&'static str],
    pub rows: Vec<SheetRow>,
    /// Zero-based column index and width in characters.
    pub column_widths: &'static [(u16, f64)],
}

impl Sheet {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|item| *item == header)
    }

    /// Cell at a data row (0-based, header excluded) under `header`.
    pub fn cell(&self, row: usize, header: &str) -> Option<&CellValue> {
        let column = self.column(header)?;
        self.rows.get(row)?.cells.get(column)
    }
}

/// Both report views plus the file name they are saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub file_name: String,
    pub summary: Sheet,
    pub detail: Sheet,
}
