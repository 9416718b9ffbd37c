//! Sampling session core.
//!
//! This module contains:
//! - Reading, interval and event types
//! - The append-only sample buffer
//! - The capture timer
//! - The session controller state machine

pub mod buffer;
pub mod controller;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use buffer::SampleBuffer;
pub use controller::{ControlSurface, Dispatch, SessionController, SessionState, StopReport};
pub use timer::CaptureTimer;
pub use types::{Affordance, Interval, Reading, SessionError, SessionEvent};
