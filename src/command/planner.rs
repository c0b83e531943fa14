//! Plan construction - converts a ParsedRequest into an executable Plan
//!
//! Symbolic directory names ("downloads", "docs") and relative paths are
//! resolved here, so every plan that acts on the filesystem carries an
//! absolute directory. Whether that directory exists is the executor's
//! concern.

use crate::core::config::{home_dir, DirectoryConfig};
use crate::llm::parser::{Intent, ParsedRequest};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Description of the plan for requests that cannot be acted on
pub const UNKNOWN_DESCRIPTION: &str = "Sorry, I don't understand what you want me to do.";

/// A fully resolved action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    OrganizeByType {
        directory: PathBuf,
        description: String,
    },
    OrganizeByDate {
        directory: PathBuf,
        use_modified: bool,
        description: String,
    },
    FindFilesByType {
        directory: PathBuf,
        file_type: String,
        description: String,
    },
    FindFileByName {
        directory: PathBuf,
        file_name: String,
        description: String,
    },
    Unknown {
        description: String,
    },
}

impl Plan {
    pub fn unknown() -> Self {
        Plan::Unknown {
            description: UNKNOWN_DESCRIPTION.to_string(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Plan::OrganizeByType { description, .. }
            | Plan::OrganizeByDate { description, .. }
            | Plan::FindFilesByType { description, .. }
            | Plan::FindFileByName { description, .. }
            | Plan::Unknown { description } => description.as_str(),
        }
    }

    /// Target directory; `None` for the unknown plan
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Plan::OrganizeByType { directory, .. }
            | Plan::OrganizeByDate { directory, .. }
            | Plan::FindFilesByType { directory, .. }
            | Plan::FindFileByName { directory, .. } => Some(directory.as_path()),
            Plan::Unknown { .. } => None,
        }
    }

    /// The intent this plan carries out
    pub fn intent(&self) -> Intent {
        match self {
            Plan::OrganizeByType { .. } => Intent::OrganizeByType,
            Plan::OrganizeByDate { .. } => Intent::OrganizeByDate,
            Plan::FindFilesByType { .. } => Intent::FindFilesByType,
            Plan::FindFileByName { .. } => Intent::FindFileByName,
            Plan::Unknown { .. } => Intent::Unknown,
        }
    }

    /// snake_case action name, as recorded in the action log
    pub fn action_name(&self) -> &'static str {
        self.intent().as_str()
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Plan::Unknown { .. })
    }
}

/// Maps directory names and relative paths to absolute paths
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    home: PathBuf,
    /// Lower-case alias -> absolute path
    aliases: BTreeMap<String, PathBuf>,
    /// Base for relative paths; the process working directory if unset
    current_dir: Option<PathBuf>,
}

impl DirectoryResolver {
    /// Resolver with the standard aliases under `home`
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let resolver = Self {
            home: home.into(),
            aliases: BTreeMap::new(),
            current_dir: None,
        };

        resolver
            .with_alias("downloads", "Downloads")
            .with_alias("download", "Downloads")
            .with_alias("desktop", "Desktop")
            .with_alias("documents", "Documents")
            .with_alias("docs", "Documents")
    }

    /// Standard aliases plus those from configuration
    pub fn from_config(config: &DirectoryConfig) -> Self {
        config
            .aliases
            .iter()
            .fold(Self::new(home_dir()), |resolver, (alias, target)| {
                resolver.with_alias(alias, target)
            })
    }

    /// Add or replace an alias; relative targets are taken under home
    pub fn with_alias(mut self, alias: &str, target: impl AsRef<Path>) -> Self {
        let target = self.home.join(target.as_ref());
        self.aliases.insert(alias.trim().to_lowercase(), target);
        self
    }

    /// Use `dir` instead of the process working directory
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Resolve a directory name to an absolute path
    ///
    /// Aliases match case-insensitively; `~` expands to home; other
    /// relative paths are taken from the working directory.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let trimmed = name.trim();
        if let Some(path) = self.aliases.get(&trimmed.to_lowercase()) {
            return path.clone();
        }
        self.resolve_path(Path::new(trimmed))
    }

    /// Resolve a path (no alias lookup)
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }

        if let Ok(rest) = path.strip_prefix("~") {
            return normalize(&self.home.join(rest));
        }

        let base = self
            .current_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| self.home.clone());
        normalize(&base.join(path))
    }
}

impl Default for DirectoryResolver {
    fn default() -> Self {
        Self::new(home_dir())
    }
}

/// Collapse `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Builds plans from parsed requests
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    default_directory: PathBuf,
    resolver: DirectoryResolver,
}

impl PlanBuilder {
    pub fn new(default_directory: impl Into<PathBuf>, resolver: DirectoryResolver) -> Self {
        Self {
            default_directory: default_directory.into(),
            resolver,
        }
    }

    pub fn resolver(&self) -> &DirectoryResolver {
        &self.resolver
    }

    /// Build a plan for `request`. Never fails; unrecognised intents give
    /// the unknown plan.
    pub fn build(&self, request: &ParsedRequest) -> Plan {
        let directory = self.directory_for(request);
        let dir = directory.display().to_string();

        let plan = match request.intent_kind() {
            Intent::OrganizeByType => Plan::OrganizeByType {
                description: format!("Organizing files in {} by file type", dir),
                directory,
            },
            Intent::OrganizeByDate => {
                let use_modified = request.bool_param("use_modified").unwrap_or(true);
                let date_type = if use_modified {
                    "modification"
                } else {
                    "creation"
                };
                Plan::OrganizeByDate {
                    description: format!("Organizing files in {} by {} date", dir, date_type),
                    directory,
                    use_modified,
                }
            }
            Intent::FindFilesByType => {
                let file_type = request.str_param("file_type").unwrap_or_default().to_string();
                Plan::FindFilesByType {
                    description: format!("Finding {} files in {}", file_type, dir),
                    directory,
                    file_type,
                }
            }
            Intent::FindFileByName => {
                let file_name = request.str_param("file_name").unwrap_or_default().to_string();
                Plan::FindFileByName {
                    description: format!("Finding files matching '{}' in {}", file_name, dir),
                    directory,
                    file_name,
                }
            }
            Intent::Unknown => Plan::unknown(),
        };

        tracing::debug!(intent = %request.intent, plan = ?plan, "Built plan");
        plan
    }

    fn directory_for(&self, request: &ParsedRequest) -> PathBuf {
        match request.str_param("directory") {
            Some(name) => self.resolver.resolve(name),
            None => self.resolver.resolve_path(&self.default_directory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::parser::Parameters;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn resolver() -> DirectoryResolver {
        DirectoryResolver::new("/home/tester").with_current_dir("/work/project")
    }

    fn builder() -> PlanBuilder {
        PlanBuilder::new("/home/tester/Documents/agent_workspace", resolver())
    }

    fn request(intent: &str, parameters: Value) -> ParsedRequest {
        ParsedRequest {
            intent: intent.to_string(),
            parameters: parameters.as_object().cloned().unwrap_or_else(Parameters::new),
        }
    }

    #[test]
    fn test_resolve_aliases_case_insensitive() {
        let r = resolver();
        let expected = PathBuf::from("/home/tester/Downloads");
        assert_eq!(r.resolve("Downloads"), expected);
        assert_eq!(r.resolve("downloads"), expected);
        assert_eq!(r.resolve("DOWNLOADS"), expected);
        assert_eq!(r.resolve("download"), expected);
        assert_eq!(r.resolve("Desktop"), PathBuf::from("/home/tester/Desktop"));
        assert_eq!(r.resolve("docs"), PathBuf::from("/home/tester/Documents"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let r = resolver();
        assert_eq!(r.resolve("reports"), PathBuf::from("/work/project/reports"));
        assert_eq!(r.resolve("./a/../b"), PathBuf::from("/work/project/b"));
        assert_eq!(r.resolve("/var/tmp"), PathBuf::from("/var/tmp"));
        assert_eq!(r.resolve("~/Music"), PathBuf::from("/home/tester/Music"));
        assert_eq!(r.resolve(""), PathBuf::from("/work/project"));
    }

    #[test]
    fn test_configured_alias() {
        let r = resolver()
            .with_alias("Pictures", "Pictures")
            .with_alias("inbox", "/srv/inbox");
        assert_eq!(r.resolve("pictures"), PathBuf::from("/home/tester/Pictures"));
        assert_eq!(r.resolve("INBOX"), PathBuf::from("/srv/inbox"));
    }

    #[test]
    fn test_organize_by_type_plan() {
        let plan = builder().build(&request("organize_by_type", json!({ "directory": "downloads" })));
        assert_eq!(
            plan,
            Plan::OrganizeByType {
                directory: PathBuf::from("/home/tester/Downloads"),
                description: "Organizing files in /home/tester/Downloads by file type".into(),
            }
        );
    }

    #[test]
    fn test_missing_directory_uses_default_workspace() {
        let plan = builder().build(&request("organize_by_type", json!({})));
        assert_eq!(
            plan.directory(),
            Some(Path::new("/home/tester/Documents/agent_workspace"))
        );
    }

    #[test]
    fn test_organize_by_date_descriptions() {
        let b = builder();

        let default = b.build(&request("organize_by_date", json!({ "directory": "desktop" })));
        assert!(default.description().contains("modification"));
        assert!(matches!(default, Plan::OrganizeByDate { use_modified: true, .. }));

        let creation = b.build(&request(
            "organize_by_date",
            json!({ "directory": "desktop", "use_modified": false }),
        ));
        assert!(creation.description().contains("creation"));
        assert!(matches!(creation, Plan::OrganizeByDate { use_modified: false, .. }));

        let null = b.build(&request(
            "organize_by_date",
            json!({ "directory": "desktop", "use_modified": null }),
        ));
        assert!(null.description().contains("creation"));
    }

    #[test]
    fn test_find_plans() {
        let b = builder();

        let by_type = b.build(&request(
            "find_files_by_type",
            json!({ "directory": "documents", "file_type": "pdf" }),
        ));
        assert_eq!(
            by_type.description(),
            "Finding pdf files in /home/tester/Documents"
        );

        let by_name = b.build(&request("find_file_by_name", json!({ "file_name": "budget" })));
        assert_eq!(
            by_name.description(),
            "Finding files matching 'budget' in /home/tester/Documents/agent_workspace"
        );
    }

    #[test]
    fn test_find_defaults_to_empty_strings() {
        let plan = builder().build(&request("find_files_by_type", json!({})));
        assert!(matches!(&plan, Plan::FindFilesByType { file_type, .. } if file_type.is_empty()));

        let plan = builder().build(&request("find_file_by_name", json!({})));
        assert!(matches!(&plan, Plan::FindFileByName { file_name, .. } if file_name.is_empty()));
    }

    #[test]
    fn test_unrecognised_intent_is_unknown() {
        let b = builder();
        for intent in ["unknown", "delete_all", "", "Organize_By_Type"] {
            let plan = b.build(&request(intent, json!({ "directory": "downloads" })));
            assert_eq!(plan, Plan::unknown());
            assert_eq!(plan.description(), UNKNOWN_DESCRIPTION);
            assert!(plan.directory().is_none());
        }
    }

    #[test]
    fn test_plan_serializes_with_action_tag() {
        let plan = builder().build(&request(
            "organize_by_date",
            json!({ "directory": "/data", "use_modified": false }),
        ));
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["action"], "organize_by_date");
        assert_eq!(value["directory"], "/data");
        assert_eq!(value["use_modified"], false);
        assert_eq!(plan.action_name(), "organize_by_date");
    }

    proptest! {
        #[test]
        fn prop_directory_always_absolute(
            intent in prop::sample::select(vec![
                "organize_by_type", "organize_by_date", "find_files_by_type", "find_file_by_name",
            ]),
            directory in ".*",
        ) {
            let plan = builder().build(&request(intent, json!({ "directory": directory })));
            let dir = plan.directory().unwrap();
            prop_assert!(dir.is_absolute(), "{} is not absolute", dir.display());
        }
    }
}
