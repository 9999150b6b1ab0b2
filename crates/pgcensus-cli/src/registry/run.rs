use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pgcensus_core::{REPORT_VERSION, RedactedConnection, Report};

use super::{RegistryError, RegistryResult};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub engine: String,
    pub run_dir: PathBuf,
    pub out_dir: PathBuf,
    pub schemas: Vec<String>,
    pub geometry_columns: Vec<String>,
    pub connection: RedactedConnection,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub tool_version: &'static str,
    pub report_version: &'static str,
    pub engine: String,
    pub schemas: Vec<String>,
    pub geometry_columns: Vec<String>,
    pub out_dir: PathBuf,
    pub connection: RedactedConnection,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub report_path: PathBuf,
    pub logs_path: PathBuf,
}

#[derive(Serialize)]
struct ReportArtifact<'a> {
    report_version: &'static str,
    run_id: &'a str,
    workbook: &'a Path,
    report: &'a Report,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");
    let report_path = root.join("report.json");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        tool_version: env!("CARGO_PKG_VERSION"),
        report_version: REPORT_VERSION,
        engine: ctx.engine.clone(),
        schemas: ctx.schemas.clone(),
        geometry_columns: ctx.geometry_columns.clone(),
        out_dir: ctx.out_dir.clone(),
        connection: ctx.connection.clone(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        root,
        report_path,
        logs_path,
    })
}

/// Store the report model next to the run config, pointing at the workbook.
pub fn write_report(
    paths: &RunPaths,
    run_id: &str,
    report: &Report,
    workbook: &Path,
) -> RegistryResult<()> {
    let artifact = ReportArtifact {
        report_version: REPORT_VERSION,
        run_id,
        workbook,
        report,
    };
    write_json(&paths.report_path, &artifact)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
