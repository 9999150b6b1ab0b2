use std::fs;
use std::path::{Path, PathBuf};

use pgcensus_introspect::DEFAULT_GEOMETRY_COLUMNS;
use serde::Deserialize;
use thiserror::Error;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pgcensus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

/// Settings accepted from `pgcensus.toml`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub connection: Option<String>,
    pub schemas: Option<Vec<String>>,
    pub geometry_columns: Option<Vec<String>>,
    pub out_dir: Option<PathBuf>,
    pub run_dir: Option<PathBuf>,
}

/// Values given on the command line; these win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub connection: Option<String>,
    pub schemas: Vec<String>,
    pub geometry_columns: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub run_dir: Option<PathBuf>,
}

/// Fully merged and validated settings for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub connection: String,
    pub engine: &'static str,
    pub schemas: Vec<String>,
    pub geometry_columns: Vec<String>,
    pub out_dir: PathBuf,
    pub run_dir: PathBuf,
}

/// Read the explicit config file, or `pgcensus.toml` when it exists.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    match explicit {
        Some(path) => read_file(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read_file(path)
            } else {
                Ok(FileConfig::default())
            }
        }
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge command line, file and environment values, then validate them.
///
/// The connection string comes from the command line, then the file, then
/// `env_connection` (normally `DATABASE_URL`).
pub fn resolve(
    file: FileConfig,
    overrides: Overrides,
    env_connection: Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let connection = overrides
        .connection
        .or(file.connection)
        .or(env_connection)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::Invalid("connection string is required".to_string()))?;
    let engine = detect_engine(&connection)?;

    let schemas = prefer_non_empty(overrides.schemas, file.schemas).unwrap_or_default();
    let schemas = clean_names(schemas);
    if schemas.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one schema is required".to_string(),
        ));
    }

    let geometry_columns = prefer_non_empty(overrides.geometry_columns, file.geometry_columns)
        .unwrap_or_else(|| {
            DEFAULT_GEOMETRY_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect()
        });
    let geometry_columns = clean_names(geometry_columns);
    if geometry_columns.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one geometry column name is required".to_string(),
        ));
    }

    Ok(ResolvedConfig {
        connection,
        engine,
        schemas,
        geometry_columns,
        out_dir: overrides
            .out_dir
            .or(file.out_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        run_dir: overrides
            .run_dir
            .or(file.run_dir)
            .unwrap_or_else(|| PathBuf::from("runs")),
    })
}

pub fn detect_engine(conn: &str) -> Result<&'static str, ConfigError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        let scheme = conn.split_once("://").map_or("<none>", |(scheme, _)| scheme);
        Err(ConfigError::UnsupportedEngine(scheme.to_string()))
    }
}

fn prefer_non_empty(flags: Vec<String>, file: Option<Vec<String>>) -> Option<Vec<String>> {
    if flags.is_empty() { file } else { Some(flags) }
}

/// Trim names, drop blanks and repeats, keep first-seen order.
fn clean_names(names: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !cleaned.iter().any(|seen| seen == name) {
            cleaned.push(name.to_string());
        }
    }
    cleaned
}
