//! Shared helpers

pub mod datetime;
pub mod double_option;
pub mod log_sanitizer;

pub use log_sanitizer::truncate_for_log;
