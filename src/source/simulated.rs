//! Simulated wrist sensor.
//!
//! Publishes a slow oscillation around a resting rate and drops to "no
//! signal" at a fixed cadence, the way an optical sensor does when it loses
//! skin contact.

use crate::session::SessionEvent;
use crate::source::types::{RateSource, SourceError};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Shape of the simulated signal.
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Time between published rates
    pub period: Duration,
    /// Centre of the oscillation, bpm
    pub baseline_bpm: f64,
    /// Peak deviation from the baseline, bpm
    pub amplitude_bpm: f64,
    /// Updates per full oscillation
    pub cycle_len: u32,
    /// Every n-th update reports no signal (0 disables dropouts)
    pub dropout_every: u32,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            baseline_bpm: 72.0,
            amplitude_bpm: 8.0,
            cycle_len: 30,
            dropout_every: 25,
        }
    }
}

impl SimulatedConfig {
    /// Rate published for update number `step`.
    pub fn rate_at(&self, step: u64) -> f64 {
        if self.dropout_every > 0 && step > 0 && step % u64::from(self.dropout_every) == 0 {
            return 0.0;
        }
        let cycle = f64::from(self.cycle_len.max(1));
        let phase = (step as f64 / cycle) * std::f64::consts::TAU;
        (self.baseline_bpm + self.amplitude_bpm * phase.sin()).round()
    }
}

/// Background thread publishing [`SimulatedConfig::rate_at`] every period.
pub struct SimulatedSource {
    config: SimulatedConfig,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    /// A stopped source; nothing is published until [`RateSource::start`].
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl RateSource for SimulatedSource {
    fn start(&mut self, events: Sender<SessionEvent>) -> Result<(), SourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }

        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("hr-simulated".to_string())
            .spawn(move || {
                let mut step = 0u64;
                while running.load(Ordering::SeqCst) {
                    let rate = config.rate_at(step);
                    if events.send(SessionEvent::RateChanged { rate }).is_err() {
                        break;
                    }
                    step += 1;
                    thread::sleep(config.period);
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

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop();
    }
}
