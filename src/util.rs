//! Utility functions shared by the storage and CLI layers.

use std::fs;
use std::path::Path;

use crate::error::{CoachError, Result};

/// Maximum file size that can be read into memory (10 MB).
///
/// Decks, banks and history files are small JSON documents; anything past
/// this is almost certainly the wrong file.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or exceeds `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| CoachError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(CoachError::input(format!(
            "File {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| CoachError::storage(path, e))
}

/// Format a second count as `mm:ss`, the way countdowns are displayed.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
