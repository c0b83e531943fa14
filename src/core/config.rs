//! Agent configuration with documented defaults
//!
//! Loaded from `$XDG_CONFIG_HOME/file-agent/config.toml` (or an explicit
//! path), then overridden by environment variables. Every field has a
//! default, so a missing file is not an error.

use crate::core::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Default completion endpoint (Anthropic messages API)
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model for intent extraction
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Returns a best-effort home directory path, always absolute.
pub fn home_dir() -> PathBuf {
    home_from(std::env::var_os("HOME"))
}

/// An empty or relative `HOME` is ignored; the working directory is the
/// last resort.
fn home_from(home: Option<OsString>) -> PathBuf {
    home.map(PathBuf::from)
        .filter(|h| h.is_absolute())
        .or_else(|| dirs::home_dir().filter(|h| h.is_absolute()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Returns `$XDG_CONFIG_HOME/file-agent` or `~/.config/file-agent`
pub fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"))
        .join("file-agent")
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Directory used when a request does not name one
    ///
    /// Must be absolute once `~` is expanded.
    pub default_workspace: PathBuf,

    /// Where the action log and preferences are persisted
    pub memory_file: PathBuf,

    /// How many trailing actions are sent to the backend as context
    ///
    /// Kept small: the history only disambiguates follow-ups like
    /// "do the same for my desktop".
    pub history_limit: usize,

    /// Language backend settings
    pub llm: LlmConfig,

    /// Extra directory aliases
    pub directories: DirectoryConfig,

    /// Log filter
    pub logging: LoggingConfig,
}

/// Language backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (can also come from LLM_API_KEY / GOOGLE_API_KEY)
    pub api_key: Option<String>,
    /// Endpoint; the wire format is detected from it
    pub api_url: String,
    pub model: String,
    /// Request timeout. Expiry counts as the backend being unavailable.
    pub timeout_secs: Option<u64>,
}

/// Directory alias table additions
///
/// Keys are matched case-insensitively. Values are relative to the home
/// directory unless absolute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by RUST_LOG
    pub level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_workspace: home_dir().join("Documents").join("agent_workspace"),
            memory_file: home_dir().join(".file_agent_memory.json"),
            history_limit: 3,
            llm: LlmConfig::default(),
            directories: DirectoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: Some(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "file_agent=info".into(),
        }
    }
}

impl AgentConfig {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load configuration from `path` (or the default location), apply
    /// environment overrides and validate the result
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| AgentError::file(&path, e))?;
            tracing::debug!(path = %path.display(), "Loaded config file");
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(url) = lookup("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(workspace) = lookup("FILE_AGENT_WORKSPACE") {
            self.default_workspace = PathBuf::from(workspace);
        }
        if let Some(memory) = lookup("FILE_AGENT_MEMORY") {
            self.memory_file = PathBuf::from(memory);
        }
    }

    fn expand_paths(&mut self) {
        self.default_workspace = expand_tilde(&self.default_workspace);
        self.memory_file = expand_tilde(&self.memory_file);
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(AgentError::ConfigError(
                "history_limit must be at least 1".into(),
            ));
        }

        if !self.default_workspace.is_absolute() {
            return Err(AgentError::ConfigError(format!(
                "default_workspace ({}) must be an absolute path",
                self.default_workspace.display()
            )));
        }

        if self.llm.timeout_secs == Some(0) {
            return Err(AgentError::ConfigError(
                "llm.timeout_secs must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AgentError::file(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| AgentError::file(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_limit, 3);
        assert!(config.default_workspace.ends_with("Documents/agent_workspace"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AgentConfig::from_toml(
            r#"
            default_workspace = "/srv/inbox"

            [llm]
            model = "deepseek-chat"

            [directories.aliases]
            pictures = "Pictures"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_workspace, PathBuf::from("/srv/inbox"));
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.api_url, DEFAULT_API_URL);
        assert_eq!(config.history_limit, 3);
        assert_eq!(
            config.directories.aliases.get("pictures").map(String::as_str),
            Some("Pictures")
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = AgentConfig::from_toml("history_limit = \"three\"");
        assert!(matches!(result, Err(AgentError::TomlError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GOOGLE_API_KEY", "gemini-key"),
            ("LLM_MODEL", "gemini-2.0-flash"),
            ("FILE_AGENT_WORKSPACE", "/tmp/workspace"),
        ]
        .into_iter()
        .collect();

        let mut config = AgentConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("gemini-key"));
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.default_workspace, PathBuf::from("/tmp/workspace"));
    }

    #[test]
    fn test_llm_api_key_preferred_over_google_key() {
        let mut config = AgentConfig::default();
        config.apply_overrides(|key| match key {
            "LLM_API_KEY" => Some("primary".into()),
            "GOOGLE_API_KEY" => Some("secondary".into()),
            _ => None,
        });
        assert_eq!(config.llm.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_validate_rejects_relative_workspace() {
        let config = AgentConfig {
            default_workspace: PathBuf::from("relative/dir"),
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let config = AgentConfig {
            history_limit: 0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde(Path::new("~/Inbox")), home_dir().join("Inbox"));
        assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }

    #[test]
    fn test_home_is_always_absolute() {
        assert_eq!(home_from(Some("/home/tester".into())), PathBuf::from("/home/tester"));
        assert!(home_from(Some(OsString::new())).is_absolute());
        assert!(home_from(Some("relative/home".into())).is_absolute());
        assert!(home_from(None).is_absolute());
        assert!(home_dir().is_absolute());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AgentConfig::default();
        config.default_workspace = dir.path().join("workspace");
        config.llm.api_key = Some("secret".into());
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let reloaded = AgentConfig::from_toml(&content).unwrap();
        assert_eq!(reloaded.default_workspace, config.default_workspace);
        assert_eq!(reloaded.llm.api_key.as_deref(), Some("secret"));
    }
}
