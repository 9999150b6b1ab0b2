pub mod errors;
pub mod naming;
pub mod render;
pub mod sheet;
pub mod xlsx;

pub use errors::ReportError;
pub use naming::{report_file_name, run_stamp, sheet_title};
pub use render::{DETAIL_HEADERS, SUMMARY_HEADERS, render_detail, render_report, render_summary};
pub use sheet::{CellValue, RenderedReport, RowStyle, Sheet, SheetRow};
pub use xlsx::write_workbook;
