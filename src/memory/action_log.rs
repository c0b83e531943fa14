//! Persisted record of actions the agent has taken
//!
//! An append-only list of actions plus a small preference map, stored as a
//! single pretty-printed JSON document:
//!
//! ```json
//! { "actions": [ { "type": "...", "details": {}, "timestamp": "...", "success": true } ],
//!   "preferences": { "last_directory": "/home/me/Downloads" } }
//! ```
//!
//! Every append is written through to disk before returning. Only the
//! actions recorded during this session are offered as context for intent
//! extraction; the full persisted list backs the `history` command.

use crate::core::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Preference key for the directory of the most recent operation
pub const LAST_DIRECTORY: &str = "last_directory";

/// A single logged action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action name, e.g. `organize_by_type`
    #[serde(rename = "type")]
    pub action_type: String,
    /// Operation-specific details (directory, counts, error text)
    #[serde(default)]
    pub details: Map<String, Value>,
    /// ISO-8601 local time
    pub timestamp: String,
    pub success: bool,
}

impl ActionRecord {
    pub fn new(action_type: impl Into<String>, details: Map<String, Value>, success: bool) -> Self {
        Self {
            action_type: action_type.into(),
            details,
            timestamp: chrono::Local::now().to_rfc3339(),
            success,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryStore {
    #[serde(default)]
    actions: Vec<ActionRecord>,
    #[serde(default)]
    preferences: Map<String, Value>,
}

/// Append-only action log with preferences
#[derive(Debug)]
pub struct ActionLog {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    store: MemoryStore,
    /// Index of the first action recorded by this process
    session_start: usize,
}

impl ActionLog {
    /// Open the log at `path`, starting empty if the file is missing or
    /// unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = match load_store(&path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Action log unreadable, starting fresh");
                MemoryStore::default()
            }
        };
        let session_start = store.actions.len();

        Self {
            path: Some(path),
            store,
            session_start,
        }
    }

    /// A log that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: MemoryStore::default(),
            session_start: 0,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an action and persist the log
    pub fn add_action(
        &mut self,
        action_type: &str,
        details: Map<String, Value>,
        success: bool,
    ) -> Result<()> {
        let record = ActionRecord::new(action_type, details, success);
        tracing::debug!(action = %record.action_type, success, "Recording action");
        self.store.actions.push(record);
        self.save()
    }

    /// Up to `limit` actions from this session, most recent last
    pub fn recent_actions(&self, limit: usize) -> &[ActionRecord] {
        let session = &self.store.actions[self.session_start..];
        &session[session.len().saturating_sub(limit)..]
    }

    /// Up to `limit` persisted actions across all sessions, most recent last
    pub fn history(&self, limit: usize) -> &[ActionRecord] {
        let all = &self.store.actions;
        &all[all.len().saturating_sub(limit)..]
    }

    pub fn len(&self) -> usize {
        self.store.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.actions.is_empty()
    }

    pub fn set_preference(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.store.preferences.insert(key.to_string(), value.into());
        self.save()
    }

    pub fn preference(&self, key: &str) -> Option<&Value> {
        self.store.preferences.get(key)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AgentError::file(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.store)?;
        fs::write(path, json).map_err(|e| AgentError::file(path, e))?;
        Ok(())
    }
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Ok(MemoryStore::default());
    }
    let content = fs::read_to_string(path).map_err(|e| AgentError::file(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_recent_actions_limit_and_order() {
        let mut log = ActionLog::in_memory();
        for i in 0..5 {
            log.add_action("organize_by_type", details(json!({ "n": i })), true)
                .unwrap();
        }

        let recent = log.recent_actions(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].details["n"], 2);
        assert_eq!(recent[2].details["n"], 4);
    }

    #[test]
    fn test_recent_actions_empty() {
        let log = ActionLog::in_memory();
        assert!(log.recent_actions(3).is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_record_serializes_type_key() {
        let record = ActionRecord::new("find_files_by_type", Map::new(), false);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "find_files_by_type");
        assert_eq!(value["success"], false);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        {
            let mut log = ActionLog::open(&path);
            log.add_action("organize_by_date", details(json!({ "directory": "/tmp" })), true)
                .unwrap();
            log.set_preference(LAST_DIRECTORY, "/tmp").unwrap();
        }

        let log = ActionLog::open(&path);
        assert_eq!(log.len(), 1);
        assert_eq!(log.history(10)[0].action_type, "organize_by_date");
        assert_eq!(log.preference(LAST_DIRECTORY), Some(&json!("/tmp")));
        // Previous sessions do not leak into extraction context
        assert!(log.recent_actions(3).is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        fs::write(&path, "{ not json").unwrap();

        let mut log = ActionLog::open(&path);
        assert!(log.is_empty());

        log.add_action("find_file_by_name", Map::new(), true).unwrap();
        let reopened = ActionLog::open(&path);
        assert_eq!(reopened.len(), 1);
    }
}
