//! `qprof.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{QprofError, QprofResult, RenderOptions, ReportFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// `;`-separated SQL file to execute.
    #[serde(default = "default_statements_path")]
    pub statements_path: PathBuf,

    /// Destination of the rendered report.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    #[serde(default = "default_format")]
    pub format: ReportFormat,

    #[serde(default)]
    pub render: RenderOptions,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Network read timeout for the session. Unset means statements may block
    /// indefinitely.
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

fn default_statements_path() -> PathBuf {
    PathBuf::from("./inputs/testing-queries.sql")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("./reports/report.txt")
}

fn default_format() -> ReportFormat {
    ReportFormat::Text
}

fn default_host() -> String {
    "mysql".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "testuser".to_string()
}

fn default_password() -> String {
    "testpassword".to_string()
}

fn default_database() -> String {
    "testdb".to_string()
}

fn default_max_attempts() -> u32 {
    100
}

fn default_delay_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            statements_path: default_statements_path(),
            report_path: default_report_path(),
            format: default_format(),
            render: RenderOptions::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            read_timeout_secs: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl DatabaseConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Applies `DB_*` overrides from the process environment.
    pub fn with_env(mut self) -> QprofResult<Self> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> QprofResult<()> {
        let db = &mut self.database;
        if let Some(host) = lookup("DB_HOST") {
            db.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            db.port = port
                .trim()
                .parse()
                .map_err(|e| QprofError::Config(format!("invalid DB_PORT {port:?}: {e}")))?;
        }
        if let Some(user) = lookup("DB_USER") {
            db.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            db.password = password;
        }
        if let Some(database) = lookup("DB_DATABASE") {
            db.database = database;
        }
        Ok(())
    }
}
