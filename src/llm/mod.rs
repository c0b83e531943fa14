//! Language backend access and request parsing

pub mod client;
pub mod context;
pub mod parser;

pub use client::{CompletionBackend, LlmClient, UnavailableBackend};
pub use parser::{Intent, IntentExtractor, ParsedRequest};
