//! Per-session collection counters.
//!
//! Tracks how much was collected and exported so the user can see it at the
//! end of a run. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current process.
#[derive(Debug)]
pub struct SessionLog {
    /// Rate notifications received from the sensor
    rate_updates: AtomicU64,
    /// Readings appended to the sample buffer
    samples_captured: AtomicU64,
    /// Captured readings that were "no signal"
    no_signal_samples: AtomicU64,
    /// Artifacts written successfully
    artifacts_exported: AtomicU64,
    /// Export attempts that failed
    export_failures: AtomicU64,
    /// Process start time
    started_at: DateTime<Utc>,
}

impl SessionLog {
    /// Create a new session log with all counters at zero.
    pub fn new() -> Self {
        Self {
            rate_updates: AtomicU64::new(0),
            samples_captured: AtomicU64::new(0),
            no_signal_samples: AtomicU64::new(0),
            artifacts_exported: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record a rate notification from the sensor.
    pub fn record_rate_update(&self) {
        self.rate_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a captured sample.
    pub fn record_sample(&self, no_signal: bool) {
        self.samples_captured.fetch_add(1, Ordering::Relaxed);
        if no_signal {
            self.no_signal_samples.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of the export attempt.
    pub fn record_export(&self, succeeded: bool) {
        if succeeded {
            self.artifacts_exported.fetch_add(1, Ordering::Relaxed);
        } else {
            self.export_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of the current counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            rate_updates: self.rate_updates.load(Ordering::Relaxed),
            samples_captured: self.samples_captured.load(Ordering::Relaxed),
            no_signal_samples: self.no_signal_samples.load(Ordering::Relaxed),
            artifacts_exported: self.artifacts_exported.load(Ordering::Relaxed),
            export_failures: self.export_failures.load(Ordering::Relaxed),
            started_at: self.started_at,
            duration_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Rate updates received: {}\n\
             - Samples captured: {}\n\
             - No-signal samples: {}\n\
             - Artifacts exported: {}\n\
             - Export failures: {}\n\
             - Run duration: {} seconds",
            stats.rate_updates,
            stats.samples_captured,
            stats.no_signal_samples,
            stats.artifacts_exported,
            stats.export_failures,
            stats.duration_secs
        )
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub rate_updates: u64,
    pub samples_captured: u64,
    pub no_signal_samples: u64,
    pub artifacts_exported: u64,
    pub export_failures: u64,
    pub started_at: DateTime<Utc>,
    /// Whole seconds since `started_at`
    pub duration_secs: u64,
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

/// Create a new shared session log.
pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}
