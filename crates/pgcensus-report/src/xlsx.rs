use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};

use crate::errors::ReportError;
use crate::sheet::{CellValue, RenderedReport, RowStyle, Sheet};

const HEADER_FILL: u32 = 0xD9D9D9;
const HEADER_FONT_SIZE: u8 = 14;
const ERROR_FONT: u32 = 0xFF0000;
const GEOMETRY_FONT: u32 = 0x008000;
const INTEGER_FORMAT: &str = "0";

struct RowFormats {
    text: Format,
    integer: Format,
}

impl RowFormats {
    fn with_font(color: Option<u32>) -> Self {
        let base = match color {
            Some(rgb) => Format::new().set_font_color(Color::RGB(rgb)),
            None => Format::new(),
        };
        Self {
            integer: base.clone().set_num_format(INTEGER_FORMAT),
            text: base,
        }
    }
}

struct Styles {
    header: Format,
    plain: RowFormats,
    error: RowFormats,
    geometry: RowFormats,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(HEADER_FONT_SIZE)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_pattern(FormatPattern::Solid),
            plain: RowFormats::with_font(None),
            error: RowFormats::with_font(Some(ERROR_FONT)),
            geometry: RowFormats::with_font(Some(GEOMETRY_FONT)),
        }
    }

    fn row(&self, style: RowStyle) -> &RowFormats {
        match style {
            RowStyle::Plain => &self.plain,
            RowStyle::Error => &self.error,
            RowStyle::Geometry => &self.geometry,
        }
    }
}

/// Write the summary and detail sheets into one workbook at `path`.
pub fn write_workbook(report: &RenderedReport, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let styles = Styles::new();
    let mut workbook = Workbook::new();
    for sheet in [&report.summary, &report.detail] {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &styles)?;
    }
    workbook.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, styles: &Styles) -> Result<(), ReportError> {
    worksheet.set_name(&sheet.title)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, *header, &styles.header)?;
    }

    for (index, row) in sheet.rows.iter().enumerate() {
        let row_num = row_index(index + 1)?;
        let formats = styles.row(row.style);
        for (col, cell) in row.cells.iter().enumerate() {
            let col = column_index(col)?;
            match cell {
                CellValue::Empty => {
                    worksheet.write_blank(row_num, col, &formats.text)?;
                }
                CellValue::Text(value) => {
                    worksheet.write_string_with_format(row_num, col, value, &formats.text)?;
                }
                CellValue::Integer(value) => {
                    worksheet.write_number_with_format(
                        row_num,
                        col,
                        *value as f64,
                        &formats.integer,
                    )?;
                }
            }
        }
    }

    for (col, width) in sheet.column_widths {
        worksheet.set_column_width(*col, *width)?;
    }

    let last_row = row_index(sheet.rows.len())?;
    let last_col = column_index(sheet.headers.len().saturating_sub(1))?;
    worksheet.autofilter(0, 0, last_row, last_col)?;
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn row_index(index: usize) -> Result<u32, ReportError> {
    u32::try_from(index).map_err(|_| ReportError::Layout(format!("row {index} out of range")))
}

fn column_index(index: usize) -> Result<u16, ReportError> {
    u16::try_from(index).map_err(|_| ReportError::Layout(format!("column {index} out of range")))
}
