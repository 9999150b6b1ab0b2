use thiserror::Error;

/// Core error type shared across pgcensus crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A statement failed on the server or the driver rejected it.
    ///
    /// `sqlstate` carries the five-character server code when the failure
    /// came from PostgreSQL itself.
    #[error("database error: {message}")]
    Db {
        sqlstate: Option<String>,
        message: String,
    },
    /// The database could not be reached or the session was lost.
    #[error("connection error: {0}")]
    Connection(String),
    /// The assembled report violates internal invariants.
    #[error("invalid report: {0}")]
    InvalidReport(String),
}

impl Error {
    /// Database error without a server code.
    pub fn db(message: impl Into<String>) -> Self {
        Self::Db {
            sqlstate: None,
            message: message.into(),
        }
    }

    /// Database error carrying the server SQLSTATE.
    pub fn db_with_state(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Db {
            sqlstate: Some(sqlstate.into()),
            message: message.into(),
        }
    }

    /// SQLSTATE of the failure, if the server reported one.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Db { sqlstate, .. } => sqlstate.as_deref(),
            _ => None,
        }
    }
}

/// Convenience alias for results returned by pgcensus crates.
pub type Result<T> = std::result::Result<T, Error>;
