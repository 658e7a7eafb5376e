use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::utils::error::{AppError, Result};

/// Creates `dir` and all of its parents when missing.
pub fn make_path(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::FileError(format!(
            "Failed to create directory {}: {}",
            dir.to_string_lossy(),
            e
        ))
    })
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| {
        AppError::FileError(format!(
            "Failed to write file {}: {}",
            path.to_string_lossy(),
            e
        ))
    })
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        AppError::FileError(format!(
            "Failed to read file {}: {}",
            path.to_string_lossy(),
            e
        ))
    })
}

/// Rejects names that would escape the folder they are written into.
pub fn ensure_plain_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(AppError::ValidationError(format!(
            "\"{}\" cannot be used as a file name",
            name
        )));
    }
    Ok(())
}

/// Current unix time in seconds.
pub fn timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Joins URL segments with single slashes.
pub fn url_join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_end_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}
