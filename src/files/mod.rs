//! File classification and movement helpers

pub mod classify;
pub mod ops;

pub use classify::{date_category, file_type, normalize_file_type, NO_EXTENSION};
pub use ops::{ensure_directory, find_by_name, list_files, safe_move_file};
