//! Crate-wide error types.

use thiserror::Error;

pub type QprofResult<T> = Result<T, QprofError>;

#[derive(Debug, Error)]
pub enum QprofError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] mysql::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("profiling error: {0}")]
    Profiling(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no statements to execute in {0}")]
    NoStatements(String),

    #[error("no statement produced a profile ({failed} failed)")]
    NoProfiles { failed: usize },
}

impl QprofError {
    /// Short machine-readable kind, used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Database(_) => "database",
            Self::Connection(_) => "connection",
            Self::Execution(_) => "execution",
            Self::Profiling(_) | Self::Decode(_) => "profiling",
            Self::NoStatements(_) => "no_statements",
            Self::NoProfiles { .. } => "no_profiles",
        }
    }
}
