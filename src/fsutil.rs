//! Small filesystem utilities.

use std::path::Path;

use crate::QprofResult;

/// Writes `value` to `path`, creating missing parent directories.
pub fn write_text(path: &Path, value: &str) -> QprofResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, value)?;
    Ok(())
}
