mod config;
mod progress;
mod registry;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use pgcensus_core::{Error as CoreError, redact_connection_string, validate_report};
use pgcensus_introspect::{PostgresCatalog, ScanOptions, build_report};
use pgcensus_report::{ReportError, render_report, write_workbook};
use thiserror::Error;
use uuid::Uuid;

use config::{ConfigError, Overrides, ResolvedConfig};
use progress::{ProgressLine, format_elapsed};
use registry::{RunContext, Verbosity, init_run_logging, start_run, write_report};

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
}

#[derive(Parser, Debug)]
#[command(
    name = "pgcensus",
    version,
    about = "Inventory PostgreSQL/PostGIS tables into a spreadsheet report"
)]
struct Cli {
    /// Database connection string (flag form).
    #[arg(long, value_name = "CONNECTION_STRING", conflicts_with = "conn_pos")]
    conn: Option<String>,
    /// Database connection string (positional form).
    #[arg(value_name = "CONNECTION_STRING")]
    conn_pos: Option<String>,
    /// Schema name(s) to scan.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Candidate geometry column name(s).
    #[arg(long, value_name = "COLUMN")]
    geometry_column: Vec<String>,
    /// Directory for the generated workbook.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Directory for run artifacts.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Config file (defaults to ./pgcensus.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Increase terminal log detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only print errors and the final result.
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            connection: self.conn.clone().or_else(|| self.conn_pos.clone()),
            schemas: self.schema.clone(),
            geometry_columns: self.geometry_column.clone(),
            out_dir: self.out_dir.clone(),
            run_dir: self.run_dir.clone(),
        }
    }

    fn verbosity(&self) -> Verbosity {
        Verbosity {
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let started = Instant::now();

    let code = match run(&cli, started).await {
        Ok(path) => {
            println!("Report generated successfully: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", error = %err);
            eprintln!("An error occurred: {err}");
            ExitCode::FAILURE
        }
    };

    println!("Total process time: {}", format_elapsed(started.elapsed()));
    code
}

async fn run(cli: &Cli, started: Instant) -> Result<PathBuf, CliError> {
    let file = config::load_file(cli.config.as_deref())?;
    let settings = config::resolve(file, cli.overrides(), std::env::var("DATABASE_URL").ok())?;
    let ResolvedConfig {
        connection,
        engine,
        schemas,
        geometry_columns,
        out_dir,
        run_dir,
    } = settings;

    let run_id = Uuid::new_v4().to_string();
    let redacted = redact_connection_string(&connection);
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        engine: engine.to_string(),
        run_dir,
        out_dir: out_dir.clone(),
        schemas: schemas.clone(),
        geometry_columns: geometry_columns.clone(),
        connection: redacted.clone(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path, cli.verbosity())?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        run_dir = %run_paths.root.display(),
        engine = engine,
        connection = %redacted.redacted,
        schemas = ?schemas,
        geometry_columns = ?geometry_columns,
    );

    let mut catalog = PostgresCatalog::connect(&connection).await?;
    tracing::info!(event = "connected", database = ?redacted.database);

    let options = ScanOptions {
        schemas,
        geometry_columns,
    };
    let mut progress = ProgressLine::new(io::stderr(), started, !cli.quiet);
    let scanned = build_report(&mut catalog, &options, &mut progress).await;
    progress.finish();
    let closed = catalog.close().await;
    let report = scanned?;
    closed?;

    validate_report(&report)?;
    tracing::info!(
        event = "scan_finished",
        tables = report.table_count(),
        columns = report.column_count(),
        failed_tables = report.failed_tables(),
        geometry_tables = report.geometry_tables(),
    );

    let rendered = render_report(&report);
    let workbook_path = out_dir.join(&rendered.file_name);
    write_workbook(&rendered, &workbook_path)?;
    tracing::info!(event = "workbook_written", path = %workbook_path.display());

    write_report(&run_paths, &run_id, &report, &workbook_path)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = started.elapsed().as_millis() as u64,
    );

    Ok(workbook_path)
}
