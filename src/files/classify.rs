//! Classification of files into organization categories

use chrono::{DateTime, Datelike, Local};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Category used for files without an extension
pub const NO_EXTENSION: &str = "no_extension";

/// File type from the extension, lower-cased, without the dot
pub fn file_type(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Normalize a user-supplied type ("PDF", ".pdf") to `file_type` form
pub fn normalize_file_type(requested: &str) -> String {
    requested.trim().trim_start_matches('.').to_lowercase()
}

/// Modification or creation time of a file
///
/// Creation time falls back to modification time on platforms that do
/// not record it.
pub fn file_time(path: &Path, use_modified: bool) -> io::Result<SystemTime> {
    let metadata = fs::metadata(path)?;
    if use_modified {
        metadata.modified()
    } else {
        metadata.created().or_else(|_| metadata.modified())
    }
}

/// Date bucket for a file, relative to now
pub fn date_category(path: &Path, use_modified: bool) -> io::Result<String> {
    let time: DateTime<Local> = file_time(path, use_modified)?.into();
    Ok(date_category_at(time, Local::now()))
}

/// Date bucket for `file_date` as seen from `now`
///
/// - earlier calendar year: `"2023"`
/// - more than 30 days ago: `"2024_03"`
/// - more than 7 days ago: `"last_month"`
/// - otherwise: `"this_week"`
pub fn date_category_at(file_date: DateTime<Local>, now: DateTime<Local>) -> String {
    let age_days = (now - file_date).num_days();

    if file_date.year() < now.year() {
        format!("{}", file_date.year())
    } else if age_days > 30 {
        format!("{}_{:02}", file_date.year(), file_date.month())
    } else if age_days > 7 {
        "last_month".to_string()
    } else {
        "this_week".to_string()
    }
}
