use std::io::Write;
use std::time::{Duration, Instant};

use pgcensus_core::{TableCounts, TableIdentity};
use pgcensus_introspect::ScanObserver;

/// `HH:MM:SS.s`, truncated to tenths of a second.
pub fn format_elapsed(elapsed: Duration) -> String {
    let tenths = elapsed.as_millis() / 100;
    let hours = tenths / 36_000;
    let minutes = (tenths / 600) % 60;
    let seconds = (tenths / 10) % 60;
    let fraction = tenths % 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{fraction}")
}

/// Rewrites a single terminal line with the elapsed time and current table.
pub struct ProgressLine<W: Write> {
    out: W,
    started: Instant,
    enabled: bool,
    dirty: bool,
}

impl<W: Write> ProgressLine<W> {
    pub fn new(out: W, started: Instant, enabled: bool) -> Self {
        Self {
            out,
            started,
            enabled,
            dirty: false,
        }
    }

    fn redraw(&mut self, stage: &str, position: usize, total: usize, table: &TableIdentity) {
        if !self.enabled {
            return;
        }
        let line = format!(
            "\rProcess time: {}  {stage} {position}/{total} {table}\x1b[K",
            format_elapsed(self.started.elapsed()),
        );
        let _ = self.out.write_all(line.as_bytes());
        let _ = self.out.flush();
        self.dirty = true;
    }

    /// Terminate the progress line so later output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.dirty {
            let _ = self.out.write_all(b"\n");
            let _ = self.out.flush();
            self.dirty = false;
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ScanObserver for ProgressLine<W> {
    fn table_started(&mut self, position: usize, total: usize, table: &TableIdentity) {
        self.redraw("probing", position, total, table);
    }

    fn table_finished(&mut self, table: &TableIdentity, counts: &TableCounts) {
        if let Some(label) = counts.error_label() {
            tracing::debug!(event = "table_flagged", table = %table, label = label);
        }
    }

    fn columns_started(&mut self, position: usize, total: usize, table: &TableIdentity) {
        self.redraw("columns", position, total, table);
    }
}
