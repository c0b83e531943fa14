//! Action history and user preferences

pub mod action_log;

pub use action_log::{ActionLog, ActionRecord, LAST_DIRECTORY};
