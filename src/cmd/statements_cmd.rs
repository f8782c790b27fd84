//! Statement listing (`qprof statements`), a dry run that never connects.

use clap::Args;
use serde::{Deserialize, Serialize};

use std::path::PathBuf;

use crate::{Config, QprofResult, load_statements};

#[derive(Debug, Clone, Default, Args)]
pub struct StatementsArgs {
    /// SQL file to parse; defaults to the configured statements path.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementList {
    pub path: String,
    pub count: usize,
    pub statements: Vec<String>,
}

pub fn statements_command(config: &Config, args: &StatementsArgs) -> QprofResult<StatementList> {
    let path = args.path.as_ref().unwrap_or(&config.statements_path);
    let statements = load_statements(path)?;
    Ok(StatementList {
        path: path.display().to_string(),
        count: statements.len(),
        statements,
    })
}
