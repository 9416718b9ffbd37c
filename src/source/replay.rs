//! Replays recorded rates, one value per line.
//!
//! Blank lines and lines starting with `#` are skipped. Values are published
//! in order at a fixed period; the source stops on its own when exhausted.

use crate::session::SessionEvent;
use crate::source::types::{RateSource, SourceError};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct ReplaySource {
    rates: Arc<Vec<f64>>,
    period: Duration,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// Parse replay text: one rate per line, blank lines and `#` comments skipped.
    pub fn parse(text: &str, period: Duration) -> Result<Self, SourceError> {
        let mut rates = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let rate: f64 = trimmed.parse().map_err(|_| SourceError::InvalidReplay {
                line: idx + 1,
                content: trimmed.to_string(),
            })?;
            rates.push(rate);
        }

        Ok(Self {
            rates: Arc::new(rates),
            period,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        })
    }

    /// Read and parse a replay file.
    pub fn from_file(path: &Path, period: Duration) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Io(format!("{path:?}: {e}")))?;
        Self::parse(&text, period)
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }
}

impl RateSource for ReplaySource {
    fn start(&mut self, events: Sender<SessionEvent>) -> Result<(), SourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }

        let running = self.running.clone();
        let rates = self.rates.clone();
        let period = self.period;

        let handle = thread::Builder::new()
            .name("hr-replay".to_string())
            .spawn(move || {
                for &rate in rates.iter() {
                    if !running.load(Ordering::SeqCst)
                        || events.send(SessionEvent::RateChanged { rate }).is_err()
                    {
                        break;
                    }
                    thread::sleep(period);
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                SourceError::Io(e.to_string())
            })?;

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}
