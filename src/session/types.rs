//! Value types shared by the session controller and its collaborators.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::time::Duration;

/// One captured heart-rate value in beats per minute.
///
/// Sub-threshold sensor values ("no signal") are stored as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(u32);

impl Reading {
    /// The value recorded when the sensor has no usable signal.
    pub const NO_SIGNAL: Reading = Reading(0);

    /// Normalize a raw sensor rate.
    ///
    /// Anything below 1 bpm, including NaN, is treated as no signal.
    /// Fractional rates are truncated.
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 1.0 {
            Reading(rate as u32)
        } else {
            Self::NO_SIGNAL
        }
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    /// True for the value stored when the sensor had no signal.
    pub fn is_no_signal(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Reading {
    fn from(bpm: u32) -> Self {
        Reading(bpm)
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seconds between capture ticks. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval(NonZeroU64);

impl Interval {
    /// Validate a user-supplied number of seconds.
    pub fn from_secs(secs: i64) -> Result<Self, SessionError> {
        u64::try_from(secs)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Interval)
            .ok_or_else(|| SessionError::InvalidInterval(secs.to_string()))
    }

    /// Parse the interval field as typed by the user.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let trimmed = input.trim();
        let secs: i64 = trimmed
            .parse()
            .map_err(|_| SessionError::InvalidInterval(trimmed.to_string()))?;
        Self::from_secs(secs)
    }

    pub fn secs(self) -> u64 {
        self.0.get()
    }

    /// Period for the capture timer.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0.get())
    }
}

/// Events consumed by the session event loop, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User asked to begin sampling every `interval_secs` seconds
    Start { interval_secs: i64 },
    /// The rate source published a new value
    RateChanged { rate: f64 },
    /// The capture timer fired
    Tick,
    /// User asked to stop, export and exit
    Stop,
}

/// Toggle label the control surface should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Start,
    Stop,
}

/// Session lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Interval was not a positive whole number of seconds
    InvalidInterval(String),
    /// A session is already running
    AlreadyStarted,
    /// Stop was requested with no running session
    NotRunning,
    /// The session already ended; a new one needs a new process
    Terminated,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidInterval(input) => write!(
                f,
                "Invalid interval '{input}': expected a positive number of seconds"
            ),
            SessionError::AlreadyStarted => write!(f, "A session is already running"),
            SessionError::NotRunning => write!(f, "No session is running"),
            SessionError::Terminated => write!(f, "The session has already ended"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_normalization() {
        assert_eq!(Reading::from_rate(0.5), Reading::NO_SIGNAL);
        assert_eq!(Reading::from_rate(-3.0), Reading::NO_SIGNAL);
        assert_eq!(Reading::from_rate(f64::NAN), Reading::NO_SIGNAL);
        assert_eq!(Reading::from_rate(1.0).bpm(), 1);
        assert_eq!(Reading::from_rate(72.0).bpm(), 72);
        assert_eq!(Reading::from_rate(72.9).bpm(), 72);
    }

    #[test]
    fn test_interval_validation() {
        assert_eq!(Interval::from_secs(2).unwrap().secs(), 2);
        assert!(matches!(
            Interval::from_secs(0),
            Err(SessionError::InvalidInterval(_))
        ));
        assert!(matches!(
            Interval::from_secs(-5),
            Err(SessionError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(Interval::parse(" 10 ").unwrap().as_duration(), Duration::from_secs(10));
        assert!(Interval::parse("").is_err());
        assert!(Interval::parse("abc").is_err());
        assert!(Interval::parse("1.5").is_err());
        assert!(Interval::parse("-1").is_err());
    }
}
