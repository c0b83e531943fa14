//! Plan execution - runs the file operation a plan describes and logs it

use crate::command::planner::Plan;
use crate::core::error::{AgentError, Result};
use crate::files::{self, classify};
use crate::memory::{ActionLog, LAST_DIRECTORY};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Executes plans against the filesystem, recording each in the action log
pub struct Dispatcher;

impl Dispatcher {
    /// Run the single operation matching `plan`
    ///
    /// Organize operations fail outright only when the directory cannot be
    /// listed; per-file problems are collected in the outcome.
    pub fn execute(log: &mut ActionLog, plan: &Plan) -> Result<ExecutionResult> {
        let result = match plan {
            Plan::OrganizeByType { directory, .. } => {
                ExecutionResult::Organized(organize_by_type(log, directory)?)
            }
            Plan::OrganizeByDate {
                directory,
                use_modified,
                ..
            } => ExecutionResult::Organized(organize_by_date(log, directory, *use_modified)?),
            Plan::FindFilesByType {
                directory,
                file_type,
                ..
            } => ExecutionResult::Found(find_files_by_type(log, directory, file_type)?),
            Plan::FindFileByName {
                directory,
                file_name,
                ..
            } => ExecutionResult::Found(find_file_by_name(log, directory, file_name)?),
            Plan::Unknown { .. } => return Ok(ExecutionResult::Nothing),
        };

        if let Some(directory) = plan.directory() {
            log.set_preference(LAST_DIRECTORY, directory.display().to_string())?;
        }

        Ok(result)
    }
}

/// Result of executing a plan
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    Organized(OrganizeOutcome),
    Found(SearchOutcome),
    /// The plan was unknown; nothing ran
    Nothing,
}

/// Files moved by an organize operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeOutcome {
    pub moved: Vec<MovedFile>,
    pub errors: Vec<FileError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Extension or date bucket the file was sorted into
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: PathBuf,
    pub error: String,
}

/// Files matched by a search operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub found: Vec<PathBuf>,
    pub error: Option<String>,
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Move each file in `directory` into `directory/<extension>`
pub fn organize_by_type(log: &mut ActionLog, directory: &Path) -> Result<OrganizeOutcome> {
    let outcome = match organize(directory, |path| Ok(classify::file_type(path))) {
        Ok(outcome) => outcome,
        Err(e) => return fail(log, "organize_by_type", directory, Map::new(), e),
    };

    log.add_action(
        "organize_by_type",
        details(json!({
            "directory": directory.display().to_string(),
            "files_moved": outcome.moved.len(),
            "errors": outcome.errors.len(),
        })),
        outcome.errors.is_empty(),
    )?;

    tracing::info!(
        directory = %directory.display(),
        moved = outcome.moved.len(),
        errors = outcome.errors.len(),
        "Organized by type"
    );
    Ok(outcome)
}

/// Move each file in `directory` into a date bucket folder
pub fn organize_by_date(
    log: &mut ActionLog,
    directory: &Path,
    use_modified: bool,
) -> Result<OrganizeOutcome> {
    let outcome = match organize(directory, |path| {
        classify::date_category(path, use_modified)
    }) {
        Ok(outcome) => outcome,
        Err(e) => {
            let extra = details(json!({ "use_modified": use_modified }));
            return fail(log, "organize_by_date", directory, extra, e);
        }
    };

    log.add_action(
        "organize_by_date",
        details(json!({
            "directory": directory.display().to_string(),
            "use_modified": use_modified,
            "files_moved": outcome.moved.len(),
            "errors": outcome.errors.len(),
        })),
        outcome.errors.is_empty(),
    )?;

    tracing::info!(
        directory = %directory.display(),
        use_modified,
        moved = outcome.moved.len(),
        errors = outcome.errors.len(),
        "Organized by date"
    );
    Ok(outcome)
}

fn organize(
    directory: &Path,
    categorize: impl Fn(&Path) -> io::Result<String>,
) -> io::Result<OrganizeOutcome> {
    let mut outcome = OrganizeOutcome::default();

    for file in files::list_files(directory)? {
        match move_into_category(directory, &file, &categorize) {
            Ok((to, category)) => outcome.moved.push(MovedFile {
                from: file,
                to,
                category,
            }),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Could not move file");
                outcome.errors.push(FileError {
                    file,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

fn move_into_category(
    directory: &Path,
    file: &Path,
    categorize: &impl Fn(&Path) -> io::Result<String>,
) -> io::Result<(PathBuf, String)> {
    let category = categorize(file)?;
    let category_dir = directory.join(&category);
    files::ensure_directory(&category_dir)?;

    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let to = files::safe_move_file(file, &category_dir.join(name))?;
    Ok((to, category))
}

// Log a failed organize operation and surface the error
fn fail<T>(
    log: &mut ActionLog,
    action: &str,
    directory: &Path,
    mut extra: Map<String, Value>,
    error: io::Error,
) -> Result<T> {
    extra.insert("directory".into(), directory.display().to_string().into());
    extra.insert("error".into(), error.to_string().into());
    if let Err(log_err) = log.add_action(action, extra, false) {
        tracing::warn!(error = %log_err, "Could not record failed action");
    }
    Err(AgentError::file(directory, error))
}

/// Files directly in `directory` whose type matches `file_type`
pub fn find_files_by_type(
    log: &mut ActionLog,
    directory: &Path,
    file_type: &str,
) -> Result<SearchOutcome> {
    let wanted = classify::normalize_file_type(file_type);
    let mut outcome = SearchOutcome::default();

    match files::list_files(directory) {
        Ok(list) => {
            outcome.found = list
                .into_iter()
                .filter(|path| classify::file_type(path) == wanted)
                .collect();
            log.add_action(
                "find_files_by_type",
                details(json!({
                    "directory": directory.display().to_string(),
                    "file_type": file_type,
                    "files_found": outcome.found.len(),
                })),
                true,
            )?;
        }
        Err(e) => {
            outcome.error = Some(e.to_string());
            log.add_action(
                "find_files_by_type",
                details(json!({
                    "directory": directory.display().to_string(),
                    "file_type": file_type,
                    "error": e.to_string(),
                })),
                false,
            )?;
        }
    }

    Ok(outcome)
}

/// Files anywhere under `directory` whose name contains `file_name`
pub fn find_file_by_name(
    log: &mut ActionLog,
    directory: &Path,
    file_name: &str,
) -> Result<SearchOutcome> {
    let mut outcome = SearchOutcome::default();

    match files::find_by_name(directory, file_name) {
        Ok(found) => {
            outcome.found = found;
            log.add_action(
                "find_file_by_name",
                details(json!({
                    "directory": directory.display().to_string(),
                    "file_name": file_name,
                    "files_found": outcome.found.len(),
                })),
                true,
            )?;
        }
        Err(e) => {
            outcome.error = Some(e.to_string());
            log.add_action(
                "find_file_by_name",
                details(json!({
                    "directory": directory.display().to_string(),
                    "file_name": file_name,
                    "error": e.to_string(),
                })),
                false,
            )?;
        }
    }

    Ok(outcome)
}
