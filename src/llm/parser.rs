//! Parse natural language requests into structured intents
//!
//! The LLM answers in free text that is expected to contain one JSON object
//! `{"intent": ..., "parameters": {...}}`. That text is untrusted: it may be
//! wrapped in prose, truncated, or missing keys. Two failure modes are
//! handled differently:
//!
//! - the backend call itself fails (network, auth, quota, timeout): the
//!   request is classified by simple keyword rules instead;
//! - the backend answers but the answer is unusable: the request is
//!   `unknown`. A backend that answered badly is still reachable, so the
//!   keyword rules are not consulted.

use crate::llm::client::CompletionBackend;
use crate::llm::context::{HistoryContext, DEFAULT_HISTORY_LIMIT};
use crate::memory::ActionRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request parameters (`directory`, `file_type`, `use_modified`, `file_name`)
pub type Parameters = Map<String, Value>;

/// The closed set of intents the agent can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Move files into one folder per extension
    OrganizeByType,
    /// Move files into date buckets
    OrganizeByDate,
    /// List files with a given extension
    FindFilesByType,
    /// Search recursively by (partial) file name
    FindFileByName,
    /// Could not determine intent
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::OrganizeByType,
        Intent::OrganizeByDate,
        Intent::FindFilesByType,
        Intent::FindFileByName,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::OrganizeByType => "organize_by_type",
            Intent::OrganizeByDate => "organize_by_date",
            Intent::FindFilesByType => "find_files_by_type",
            Intent::FindFileByName => "find_file_by_name",
            Intent::Unknown => "unknown",
        }
    }

    /// Classify an intent string; anything unrecognised is `Unknown`
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == name)
            .unwrap_or(Intent::Unknown)
    }
}

/// Intent and parameters extracted from one utterance
///
/// The intent is kept exactly as the backend produced it; an unrecognised
/// string is not an error here and only becomes `Unknown` when classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRequest {
    pub intent: String,
    pub parameters: Parameters,
}

impl ParsedRequest {
    pub fn new(intent: Intent, parameters: Parameters) -> Self {
        Self {
            intent: intent.as_str().to_string(),
            parameters,
        }
    }

    /// `{intent: "unknown", parameters: {}}`
    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, Parameters::new())
    }

    pub fn intent_kind(&self) -> Intent {
        Intent::from_name(&self.intent)
    }

    /// String parameter, if present and a string
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Boolean parameter
    ///
    /// Accepts JSON booleans and "true"/"false" strings. `null` reads as
    /// false and numbers as `n != 0`.
    pub fn bool_param(&self, key: &str) -> Option<bool> {
        match self.parameters.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Null => Some(false),
            Value::Number(n) => Some(n.as_f64().map_or(false, |n| n != 0.0)),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Turns utterances into `ParsedRequest`s via a language backend
pub struct IntentExtractor {
    backend: Box<dyn CompletionBackend>,
    history_limit: usize,
}

impl IntentExtractor {
    pub fn new(backend: impl CompletionBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Number of trailing actions sent as context
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Extract intent and parameters from an utterance
    ///
    /// Never fails: backend errors fall back to keyword matching, unusable
    /// answers become `unknown`.
    pub async fn extract(&self, utterance: &str, history: &[ActionRecord]) -> ParsedRequest {
        let context = HistoryContext::from_actions(history, self.history_limit);
        let user_prompt = build_user_prompt(utterance, &context);

        match self.backend.complete(PARSE_SYSTEM_PROMPT, &user_prompt).await {
            Ok(response) => {
                tracing::debug!(response = %response, "Backend response");
                validate_response(&response).unwrap_or_else(|| {
                    tracing::warn!("Backend response had no usable intent");
                    ParsedRequest::unknown()
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Language backend unavailable, using keyword matching");
                fallback_parse(utterance)
            }
        }
    }
}

fn build_user_prompt(utterance: &str, context: &HistoryContext) -> String {
    let mut prompt = format!("User request: {}\n\n", utterance);
    if !context.is_empty() {
        prompt.push_str(&context.summary());
        prompt.push_str("\n\n");
    }
    prompt.push_str("Parse this request into intent and parameters.");
    prompt
}

/// Byte ranges of balanced top-level `{...}` spans, string-aware
fn object_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    // Delimiters are ASCII, so byte offsets are always char boundaries
    for (i, &b) in text.as_bytes().iter().enumerate() {
        if depth == 0 {
            if b == b'{' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    spans
}

/// Extract the first JSON object from an LLM response (handles
/// surrounding text)
///
/// Only the first top-level `{...}` span is considered. Returns `None`
/// when there is none (e.g. the object is cut off) or when it does not
/// parse as a JSON object.
pub fn extract_json(response: &str) -> Option<&str> {
    let (start, end) = object_spans(response).into_iter().next()?;
    let candidate = &response[start..end];
    matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Object(_))).then_some(candidate)
}

/// Validate a raw backend response into a `ParsedRequest`
///
/// The object must have a string `intent` and an object `parameters`
/// (possibly empty). The intent value itself is not checked.
pub fn validate_response(response: &str) -> Option<ParsedRequest> {
    let json = extract_json(response)?;
    let Value::Object(mut object) = serde_json::from_str::<Value>(json).ok()? else {
        return None;
    };

    let intent = match object.remove("intent")? {
        Value::String(intent) => intent,
        _ => return None,
    };
    let parameters = match object.remove("parameters")? {
        Value::Object(parameters) => parameters,
        _ => return None,
    };

    Some(ParsedRequest { intent, parameters })
}

/// Keyword-based classification used when the backend is unavailable
///
/// Deliberately coarse; always targets the downloads folder.
pub fn fallback_parse(utterance: &str) -> ParsedRequest {
    let input = utterance.to_lowercase();

    if input.contains("organize") || input.contains("sort") {
        if input.contains("type") {
            return request(Intent::OrganizeByType, [("directory", "downloads".into())]);
        }
        if input.contains("date") {
            return request(
                Intent::OrganizeByDate,
                [("directory", "downloads".into()), ("use_modified", true.into())],
            );
        }
    } else if input.contains("find") {
        if input.contains("pdf") {
            return request(
                Intent::FindFilesByType,
                [("directory", "downloads".into()), ("file_type", "pdf".into())],
            );
        }
        if let Some(name) = input.split_whitespace().find(|word| word.contains('.')) {
            return request(
                Intent::FindFileByName,
                [("directory", "downloads".into()), ("file_name", name.into())],
            );
        }
    }

    ParsedRequest::unknown()
}

fn request<const N: usize>(intent: Intent, params: [(&str, Value); N]) -> ParsedRequest {
    let parameters = params
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    ParsedRequest::new(intent, parameters)
}

/// System prompt for request parsing
const PARSE_SYSTEM_PROMPT: &str = r#"You are an assistant that helps with file organization tasks.
Analyze the user's request and extract the intent and parameters.

VALID INTENTS:
1. organize_by_type - Organize files by their file extension
2. organize_by_date - Organize files by their creation or modification date
3. find_files_by_type - Find files of a specific type
4. find_file_by_name - Find a specific file by name or partial name
5. unknown - If you can't determine the intent

PARAMETERS:
- directory: The directory to operate on ("downloads", "desktop", "documents", or a specific path)
- file_type: For find_files_by_type, the type of file to find (pdf, jpg, txt, etc.)
- use_modified: For organize_by_date, whether to use modification date (true) or creation date (false)
- file_name: For find_file_by_name, the name or partial name to search for

OUTPUT FORMAT (JSON only, no explanation):
{"intent": "INTENT", "parameters": {...}}

Examples:
"find all my pdfs in downloads" -> {"intent": "find_files_by_type", "parameters": {"directory": "downloads", "file_type": "pdf"}}
"sort my desktop by creation date" -> {"intent": "organize_by_date", "parameters": {"directory": "desktop", "use_modified": false}}
"where is budget.xlsx" -> {"intent": "find_file_by_name", "parameters": {"file_name": "budget.xlsx"}}
"#;
