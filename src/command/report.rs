//! User-facing summaries of execution results

use crate::command::executor::{ExecutionResult, OrganizeOutcome, SearchOutcome};
use crate::command::planner::Plan;
use std::collections::BTreeSet;
use std::path::Path;

/// Render the result of running `plan` as a message for the user
pub fn format_response(plan: &Plan, result: &ExecutionResult) -> String {
    match (plan, result) {
        (Plan::OrganizeByType { directory, .. }, ExecutionResult::Organized(outcome)) => {
            organized(outcome, directory, "type", "Created folders")
        }
        (Plan::OrganizeByDate { directory, .. }, ExecutionResult::Organized(outcome)) => {
            organized(outcome, directory, "date", "Created date categories")
        }
        (
            Plan::FindFilesByType {
                directory,
                file_type,
                ..
            },
            ExecutionResult::Found(outcome),
        ) => found_by_type(outcome, directory, file_type),
        (
            Plan::FindFileByName {
                directory,
                file_name,
                ..
            },
            ExecutionResult::Found(outcome),
        ) => found_by_name(outcome, directory, file_name),
        _ => plan.description().to_string(),
    }
}

fn organized(outcome: &OrganizeOutcome, directory: &Path, by: &str, label: &str) -> String {
    let categories: BTreeSet<&str> = outcome.moved.iter().map(|m| m.category.as_str()).collect();
    let mut message = format!(
        "I organized {} files in {} by {}.\n{}: {}",
        outcome.moved.len(),
        directory.display(),
        by,
        label,
        categories.into_iter().collect::<Vec<_>>().join(", ")
    );

    if !outcome.errors.is_empty() {
        message.push_str(&format!("\n{} files could not be moved:", outcome.errors.len()));
        for error in &outcome.errors {
            message.push_str(&format!("\n  - {}: {}", file_name(&error.file), error.error));
        }
    }
    message
}

fn found_by_type(outcome: &SearchOutcome, directory: &Path, file_type: &str) -> String {
    if let Some(error) = &outcome.error {
        return format!("Error while searching: {}", error);
    }
    if outcome.found.is_empty() {
        return format!(
            "I couldn't find any {} files in {}.",
            file_type,
            directory.display()
        );
    }

    let list: Vec<_> = outcome.found.iter().map(|f| file_name(f)).collect();
    format!(
        "I found {} {} files in {}:\n  - {}",
        outcome.found.len(),
        file_type,
        directory.display(),
        list.join("\n  - ")
    )
}

fn found_by_name(outcome: &SearchOutcome, directory: &Path, pattern: &str) -> String {
    if let Some(error) = &outcome.error {
        return format!("Error while searching: {}", error);
    }
    if outcome.found.is_empty() {
        return format!(
            "I couldn't find any files matching '{}' in {}.",
            pattern,
            directory.display()
        );
    }

    let list: Vec<_> = outcome
        .found
        .iter()
        .map(|f| {
            let parent = f.parent().map(|p| p.display().to_string()).unwrap_or_default();
            format!("{} (in {})", file_name(f), parent)
        })
        .collect();
    format!(
        "I found {} files matching '{}':\n  - {}",
        outcome.found.len(),
        pattern,
        list.join("\n  - ")
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::executor::{FileError, MovedFile};
    use std::path::PathBuf;

    fn moved(category: &str) -> MovedFile {
        MovedFile {
            from: PathBuf::from("/d/x"),
            to: PathBuf::from(format!("/d/{}/x", category)),
            category: category.into(),
        }
    }

    #[test]
    fn test_organized_lists_unique_categories() {
        let plan = Plan::OrganizeByType {
            directory: PathBuf::from("/d"),
            description: String::new(),
        };
        let result = ExecutionResult::Organized(OrganizeOutcome {
            moved: vec![moved("pdf"), moved("jpg"), moved("pdf")],
            errors: vec![],
        });

        assert_eq!(
            format_response(&plan, &result),
            "I organized 3 files in /d by type.\nCreated folders: jpg, pdf"
        );
    }

    #[test]
    fn test_organized_reports_errors() {
        let plan = Plan::OrganizeByDate {
            directory: PathBuf::from("/d"),
            use_modified: true,
            description: String::new(),
        };
        let result = ExecutionResult::Organized(OrganizeOutcome {
            moved: vec![moved("this_week")],
            errors: vec![FileError {
                file: PathBuf::from("/d/locked.txt"),
                error: "permission denied".into(),
            }],
        });

        let text = format_response(&plan, &result);
        assert!(text.starts_with("I organized 1 files in /d by date."));
        assert!(text.contains("Created date categories: this_week"));
        assert!(text.contains("locked.txt: permission denied"));
    }

    #[test]
    fn test_found_by_type_messages() {
        let plan = Plan::FindFilesByType {
            directory: PathBuf::from("/d"),
            file_type: "pdf".into(),
            description: String::new(),
        };

        let none = ExecutionResult::Found(SearchOutcome::default());
        assert_eq!(
            format_response(&plan, &none),
            "I couldn't find any pdf files in /d."
        );

        let some = ExecutionResult::Found(SearchOutcome {
            found: vec![PathBuf::from("/d/a.pdf"), PathBuf::from("/d/b.pdf")],
            error: None,
        });
        assert_eq!(
            format_response(&plan, &some),
            "I found 2 pdf files in /d:\n  - a.pdf\n  - b.pdf"
        );

        let failed = ExecutionResult::Found(SearchOutcome {
            found: vec![],
            error: Some("No such file or directory".into()),
        });
        assert_eq!(
            format_response(&plan, &failed),
            "Error while searching: No such file or directory"
        );
    }

    #[test]
    fn test_found_by_name_shows_parent() {
        let plan = Plan::FindFileByName {
            directory: PathBuf::from("/d"),
            file_name: "report".into(),
            description: String::new(),
        };
        let result = ExecutionResult::Found(SearchOutcome {
            found: vec![PathBuf::from("/d/2023/report.docx")],
            error: None,
        });

        assert_eq!(
            format_response(&plan, &result),
            "I found 1 files matching 'report':\n  - report.docx (in /d/2023)"
        );
    }

    #[test]
    fn test_unknown_plan_uses_description() {
        let plan = Plan::unknown();
        assert_eq!(
            format_response(&plan, &ExecutionResult::Nothing),
            plan.description()
        );
    }
}
