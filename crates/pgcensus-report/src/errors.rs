use thiserror::Error;

/// Errors emitted while writing the report workbook.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("layout error: {0}")]
    Layout(String),
}
