//! Batch profiling command (`qprof run`).

use clap::Args;

use std::path::PathBuf;

use crate::{
    Config, MysqlSession, QprofError, QprofResult, RetryPolicy, RunClock, RunSummary, Session,
    connect_with_retry, load_statements, render_as, run_batch, write_text,
};

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// SQL file with `;`-separated statements.
    #[arg(long, value_name = "PATH")]
    pub statements: Option<PathBuf>,
    /// Report destination.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
    #[arg(long)]
    pub format: Option<crate::ReportFormat>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub database: Option<String>,
    /// Also render the memory section.
    #[arg(long)]
    pub memory: bool,
    /// Also render the block I/O section.
    #[arg(long = "block-io")]
    pub block_io: bool,
    /// Connection attempts before giving up.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl RunArgs {
    /// Flags take precedence over file and environment settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.statements {
            config.statements_path = path.clone();
        }
        if let Some(path) = &self.out {
            config.report_path = path.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(host) = &self.host {
            config.database.host = host.clone();
        }
        if let Some(port) = self.port {
            config.database.port = port;
        }
        if let Some(database) = &self.database {
            config.database.database = database.clone();
        }
        config.render.memory |= self.memory;
        config.render.block_io |= self.block_io;
        if let Some(n) = self.max_attempts {
            config.retry.max_attempts = n;
        }
    }
}

pub fn run_command(config: &Config, args: &RunArgs) -> QprofResult<RunSummary> {
    let mut config = config.clone();
    args.apply(&mut config);

    let statements = load_statements(&config.statements_path)?;
    if statements.is_empty() {
        return Err(QprofError::NoStatements(
            config.statements_path.display().to_string(),
        ));
    }

    let db = config.database.clone();
    tracing::info!(
        "connecting to {}@{}:{}/{}",
        db.user,
        db.host,
        db.port,
        db.database
    );
    let session = connect_with_retry(RetryPolicy::from(&config.retry), || {
        MysqlSession::connect(&db)
    })?;
    profile_statements(session, &config, &statements)
}

/// Runs `statements` on `session`, then renders and writes the report.
///
/// The session is closed before rendering. Nothing is written when no
/// statement produced a profile.
pub fn profile_statements<S: Session>(
    mut session: S,
    config: &Config,
    statements: &[String],
) -> QprofResult<RunSummary> {
    let clock = RunClock::start();
    tracing::info!("run {} started with {} statements", clock.run_id(), statements.len());
    let outcome = run_batch(&mut session, statements);
    session.close();

    let mut summary = clock.finish(&outcome, config.format);
    if outcome.report.is_empty() {
        return Err(QprofError::NoProfiles {
            failed: outcome.failures.len(),
        });
    }

    let text = render_as(&outcome.report, config.format, config.render)?;
    write_text(&config.report_path, &text)?;
    tracing::info!("report saved at {}", config.report_path.display());
    summary.report_path = Some(config.report_path.display().to_string());
    Ok(summary)
}
