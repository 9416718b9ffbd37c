//! Transparency module for the heart-rate recorder.
//!
//! Counts what a run collected and exported so it can be shown to the user.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, SessionLog, SessionStats, SharedSessionLog};
