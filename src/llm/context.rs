//! Recent-action context for LLM prompts
//!
//! Follow-up requests ("now do the same on my desktop") only make sense
//! with a little history, so the last few actions are rendered into the
//! prompt as short text lines.

use crate::memory::ActionRecord;
use serde_json::Value;

/// Default number of trailing actions included in a prompt
pub const DEFAULT_HISTORY_LIMIT: usize = 3;

/// One past action as shown to the LLM
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLine {
    pub action_type: String,
    /// Details rendered as compact JSON
    pub details: String,
}

/// Trailing action history for a prompt
#[derive(Debug, Clone, Default)]
pub struct HistoryContext {
    pub lines: Vec<HistoryLine>,
}

impl HistoryContext {
    /// Keep the last `limit` of `actions` (oldest first)
    pub fn from_actions(actions: &[ActionRecord], limit: usize) -> Self {
        let start = actions.len().saturating_sub(limit);
        let lines = actions[start..]
            .iter()
            .map(|action| HistoryLine {
                action_type: action.action_type.clone(),
                details: Value::Object(action.details.clone()).to_string(),
            })
            .collect();

        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text block for the prompt; empty when there is no history
    pub fn summary(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }

        let mut s = String::from("Recent actions:");
        for line in &self.lines {
            s.push_str(&format!("\n- {}: {}", line.action_type, line.details));
        }
        s
    }
}
