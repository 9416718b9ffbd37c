//! Heart-rate sources for the recorder.
//!
//! A source runs on its own thread and publishes rate notifications into the
//! session event channel. It never touches session state directly.

pub mod replay;
pub mod simulated;
pub mod types;

// Re-export commonly used types
pub use replay::ReplaySource;
pub use simulated::{SimulatedConfig, SimulatedSource};
pub use types::{RateSource, SourceError};
