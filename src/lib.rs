//! File Agent - natural language file organization

pub mod agent;
pub mod command;
pub mod core;
pub mod files;
pub mod llm;
pub mod memory;

pub use agent::{Agent, Response};
