//! Statement source: `;`-separated SQL files.

use std::path::Path;

use crate::QprofResult;

pub const STATEMENT_SEPARATOR: char = ';';

/// Splits `text` into trimmed statements, dropping empty entries.
pub fn parse_statements(text: &str) -> Vec<String> {
    text.split(STATEMENT_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn load_statements(path: &Path) -> QprofResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let statements = parse_statements(&text);
    tracing::debug!("loaded {} statements from {}", statements.len(), path.display());
    Ok(statements)
}
