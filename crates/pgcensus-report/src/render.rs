use pgcensus_core::{KeyKind, Report, TableCounts, TableDescriptor};

use crate::naming::{detail_title, report_file_name, run_stamp, summary_title};
use crate::sheet::{CellValue, RenderedReport, RowStyle, Sheet, SheetRow};

pub const SUMMARY_HEADERS: [&str; 12] = [
    "#",
    "schema_name",
    "schema_description",
    "class_name",
    "class_description",
    "geom_fieldname",
    "geom_type",
    "primary_key",
    "unique_key",
    "foreign_key",
    "records_number",
    "columns_number",
];

pub const DETAIL_HEADERS: [&str; 13] = [
    "#",
    "schema_name",
    "schema_description",
    "class_name",
    "class_description",
    "geom_type",
    "primary_key",
    "unique_key",
    "foreign_key",
    "column_name",
    "comment",
    "data_type",
    "not_null",
];

const SUMMARY_WIDTHS: [(u16, f64); 11] = [
    (1, 20.0),
    (2, 35.0),
    (3, 60.0),
    (4, 60.0),
    (5, 15.0),
    (6, 25.0),
    (7, 15.0),
    (8, 30.0),
    (9, 30.0),
    (10, 25.0),
    (11, 25.0),
];

const DETAIL_WIDTHS: [(u16, f64); 11] = [
    (1, 20.0),
    (2, 35.0),
    (3, 60.0),
    (4, 60.0),
    (5, 15.0),
    (6, 30.0),
    (7, 30.0),
    (8, 30.0),
    (9, 30.0),
    (10, 25.0),
    (11, 15.0),
];

/// Render both report views and the workbook file name.
pub fn render_report(report: &Report) -> RenderedReport {
    let stamp = run_stamp(&report.generated_at);
    RenderedReport {
        file_name: report_file_name(&report.database, &stamp),
        summary: render_summary(report, &stamp),
        detail: render_detail(report),
    }
}

/// One row per table; failed probes are styled as errors.
pub fn render_summary(report: &Report, stamp: &str) -> Sheet {
    let rows = report
        .tables
        .iter()
        .enumerate()
        .map(|(index, table)| summary_row(index + 1, &table.descriptor))
        .collect();

    Sheet {
        title: summary_title(&report.database, stamp),
        headers: &SUMMARY_HEADERS,
        rows,
        column_widths: &SUMMARY_WIDTHS,
    }
}

fn summary_row(position: usize, table: &TableDescriptor) -> SheetRow {
    let mut cells = identity_cells(position, table);
    cells.extend([
        CellValue::text(table.geometry.field_label()),
        CellValue::text(table.geometry.type_label()),
    ]);
    cells.extend(KeyKind::ALL.map(|kind| CellValue::text(table.keys.columns(kind).display())));
    cells.extend([records_cell(&table.counts), columns_cell(&table.counts)]);

    let style = if table.counts.error_label().is_some() {
        RowStyle::Error
    } else {
        RowStyle::Plain
    };
    SheetRow { cells, style }
}

fn records_cell(counts: &TableCounts) -> CellValue {
    match counts.records() {
        Some(records) => CellValue::count(records),
        None => CellValue::text(counts.records_label()),
    }
}

fn columns_cell(counts: &TableCounts) -> CellValue {
    match counts.columns() {
        Some(columns) => CellValue::count(columns),
        None => CellValue::text(counts.columns_label()),
    }
}

/// One row per column, numbered across all tables; every row of a table
/// with a geometry column is styled as geometry.
pub fn render_detail(report: &Report) -> Sheet {
    let mut rows = Vec::with_capacity(report.column_count());

    for table in &report.tables {
        let descriptor = &table.descriptor;
        let style = if descriptor.geometry.has_geometry() {
            RowStyle::Geometry
        } else {
            RowStyle::Plain
        };

        for column in &table.columns {
            let mut cells = identity_cells(rows.len() + 1, descriptor);
            cells.push(CellValue::text(descriptor.geometry.type_label()));
            cells.extend(KeyKind::ALL.map(|kind| CellValue::text(column.key_flag(kind))));
            cells.extend([
                CellValue::text(column.name.as_str()),
                CellValue::text(column.comment_label()),
                CellValue::text(column.data_type.as_str()),
                CellValue::flag(!column.nullable),
            ]);
            rows.push(SheetRow { cells, style });
        }
    }

    Sheet {
        title: detail_title(report.table_count()),
        headers: &DETAIL_HEADERS,
        rows,
        column_widths: &DETAIL_WIDTHS,
    }
}

fn identity_cells(position: usize, table: &TableDescriptor) -> Vec<CellValue> {
    vec![
        CellValue::count(position as u64),
        CellValue::text(table.identity.schema_name.as_str()),
        CellValue::optional_text(table.schema_description.as_deref()),
        CellValue::text(table.identity.class_name.as_str()),
        CellValue::optional_text(table.class_description.as_deref()),
    ]
}
