use chrono::{DateTime, Local};

/// Longest sheet title a workbook accepts.
pub const MAX_TITLE_CHARS: usize = 31;

const FORBIDDEN_TITLE_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Run timestamp embedded in titles and file names, e.g. `20241005_14-03-59`.
pub fn run_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H-%M-%S").to_string()
}

/// Replace characters sheet titles cannot hold and cut to the title limit.
///
/// A title may not start or end with an apostrophe, so one left at either
/// edge after the cut is replaced as well.
pub fn sheet_title(raw: &str) -> String {
    let mut title: Vec<char> = raw
        .chars()
        .map(|ch| {
            if FORBIDDEN_TITLE_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .take(MAX_TITLE_CHARS)
        .collect();
    if let Some(first) = title.first_mut().filter(|ch| **ch == '\'') {
        *first = '_';
    }
    if let Some(last) = title.last_mut().filter(|ch| **ch == '\'') {
        *last = '_';
    }
    title.into_iter().collect()
}

pub fn summary_title(database: &str, stamp: &str) -> String {
    sheet_title(&format!("Report_{database}_{stamp}"))
}

pub fn detail_title(table_count: usize) -> String {
    sheet_title(&format!("{table_count}_classes_attributes"))
}

/// `<database>_geom_report_<stamp>.xlsx`, with path separators neutralized.
pub fn report_file_name(database: &str, stamp: &str) -> String {
    let database: String = database
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    format!("{database}_geom_report_{stamp}.xlsx")
}
