//! Filesystem primitives used by the dispatcher

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Regular files directly inside `directory`, sorted by path
pub fn list_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Create `directory` (and parents) if missing
pub fn ensure_directory(directory: &Path) -> io::Result<()> {
    fs::create_dir_all(directory)
}

/// Move `source` to `destination` without overwriting
///
/// On a name conflict, `name_1.ext`, `name_2.ext`, ... are tried in turn.
/// Returns the path the file ended up at.
pub fn safe_move_file(source: &Path, destination: &Path) -> io::Result<PathBuf> {
    let target = free_destination(destination);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    move_file(source, &target)?;
    Ok(target)
}

/// First non-existing path among `destination`, `stem_1.ext`, `stem_2.ext`, ...
pub fn free_destination(destination: &Path) -> PathBuf {
    if !destination.exists() {
        return destination.to_path_buf();
    }

    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = destination.with_file_name(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

// rename fails across filesystems; fall back to copy + remove
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Err(rename_err) = fs::rename(source, target) {
        tracing::debug!(
            from = %source.display(),
            to = %target.display(),
            error = %rename_err,
            "Rename failed, copying instead"
        );
        fs::copy(source, target).map_err(|_| rename_err)?;
        fs::remove_file(source)?;
    }
    Ok(())
}

/// Files anywhere under `directory` whose name contains `pattern`
/// (case-insensitive)
///
/// Fails only if `directory` itself cannot be read; unreadable
/// subdirectories are skipped.
pub fn find_by_name(directory: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
    fs::read_dir(directory)?;

    let pattern = pattern.to_lowercase();
    let mut found = Vec::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .contains(&pattern)
        {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}
