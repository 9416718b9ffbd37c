//! Rate source abstraction.

use crate::session::SessionEvent;
use crossbeam_channel::Sender;

/// A heart-rate sensor that publishes `SessionEvent::RateChanged`.
///
/// The subscription lasts for the life of the process: a source is started
/// once and keeps publishing until stopped or exhausted.
pub trait RateSource {
    /// Start publishing on `events`.
    fn start(&mut self, events: Sender<SessionEvent>) -> Result<(), SourceError>;

    /// Stop publishing and release the background thread.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Errors from rate sources.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    /// A replay line could not be parsed as a rate
    InvalidReplay { line: usize, content: String },
    Io(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Rate source is already running"),
            SourceError::InvalidReplay { line, content } => {
                write!(f, "Invalid rate on replay line {line}: '{content}'")
            }
            SourceError::Io(e) => write!(f, "Rate source IO error: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}
