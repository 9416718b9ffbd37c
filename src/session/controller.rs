//! The sampling session state machine.
//!
//! A controller runs exactly one session per process:
//!
//! ```text
//! Idle ──start(interval)──▶ Running ──stop()──▶ Terminal
//!                            │   ▲
//!                            └───┘ tick: append current reading
//! ```
//!
//! Rate changes only update the current reading; samples are taken by the
//! capture timer alone. `stop()` disarms the timer before anything else,
//! exports the buffer once, then asks the control surface to exit.

use crate::export::{ArtifactHandle, ExportError, Exporter};
use crate::session::buffer::SampleBuffer;
use crate::session::timer::CaptureTimer;
use crate::session::types::{Affordance, Interval, Reading, SessionError, SessionEvent};
use crate::transparency::{create_shared_log, SharedSessionLog};
use crossbeam_channel::{never, Receiver};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The user-facing side of the screen.
pub trait ControlSurface {
    /// Flip the toggle between "start" and "stop".
    fn show_affordance(&mut self, affordance: Affordance);

    /// Show the reading that was just captured.
    fn show_reading(&mut self, reading: Reading);

    /// End the application. Called at most once.
    fn request_exit(&mut self);
}

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running { interval: Interval },
    Terminal,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running { .. })
    }
}

/// What a completed session produced.
#[derive(Debug)]
pub struct StopReport {
    /// Everything captured between start and stop, in capture order
    pub readings: Vec<Reading>,
    /// Outcome of the single export attempt
    pub export: Result<ArtifactHandle, ExportError>,
}

/// Result of handling one event.
#[derive(Debug)]
pub enum Dispatch {
    Continue,
    Finished(StopReport),
}

/// Owns the session state, the current reading and the sample buffer.
pub struct SessionController<E: Exporter, S: ControlSurface> {
    state: SessionState,
    current: Reading,
    buffer: SampleBuffer,
    timer: Option<CaptureTimer>,
    exporter: E,
    surface: S,
    log: SharedSessionLog,
}

impl<E: Exporter, S: ControlSurface> SessionController<E, S> {
    /// An idle controller with no signal and an empty buffer.
    pub fn new(exporter: E, surface: S) -> Self {
        Self {
            state: SessionState::Idle,
            current: Reading::NO_SIGNAL,
            buffer: SampleBuffer::new(),
            timer: None,
            exporter,
            surface,
            log: create_shared_log(),
        }
    }

    /// Share an existing session log instead of a private one.
    pub fn with_log(mut self, log: SharedSessionLog) -> Self {
        self.log = log;
        self
    }

    /// Present the initial "start" affordance.
    pub fn present(&mut self) {
        self.surface.show_affordance(Affordance::Start);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Value the next tick would capture.
    pub fn current_reading(&self) -> Reading {
        self.current
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn log(&self) -> &SharedSessionLog {
        &self.log
    }

    /// Capture ticks for the event loop. Never fires unless Running.
    pub fn ticks(&self) -> Receiver<Instant> {
        match &self.timer {
            Some(timer) if self.state.is_running() => timer.ticks(),
            _ => never(),
        }
    }

    /// Begin sampling every `interval_secs` seconds.
    pub fn start(&mut self, interval_secs: i64) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Running { .. } => return Err(SessionError::AlreadyStarted),
            SessionState::Terminal => return Err(SessionError::Terminated),
        }

        let interval = Interval::from_secs(interval_secs)?;
        self.timer = Some(CaptureTimer::arm(interval.as_duration()));
        self.state = SessionState::Running { interval };
        self.surface.show_affordance(Affordance::Stop);

        info!(interval_secs = interval.secs(), "sampling session started");
        Ok(())
    }

    /// Record the latest sensor value for the next capture.
    pub fn on_rate_changed(&mut self, rate: f64) {
        let reading = Reading::from_rate(rate);
        if reading.is_no_signal() {
            debug!(rate, "no signal from rate source");
        }
        self.current = reading;
        self.log.record_rate_update();
    }

    /// Capture the current reading. Returns false when no session is capturing.
    pub fn on_tick(&mut self) -> bool {
        let armed = self.timer.as_ref().is_some_and(CaptureTimer::is_armed);
        if !armed || !self.state.is_running() {
            debug!("tick ignored, timer disarmed");
            return false;
        }

        let reading = self.current;
        self.buffer.append(reading);
        self.log.record_sample(reading.is_no_signal());
        self.surface.show_reading(reading);

        debug!(bpm = reading.bpm(), samples = self.buffer.len(), "sample captured");
        true
    }

    /// End the session: disarm, export once, then request exit.
    pub fn stop(&mut self) -> Result<StopReport, SessionError> {
        match self.state {
            SessionState::Running { .. } => {}
            SessionState::Idle => return Err(SessionError::NotRunning),
            SessionState::Terminal => return Err(SessionError::Terminated),
        }

        if let Some(timer) = self.timer.take() {
            timer.disarm();
        }
        self.state = SessionState::Terminal;

        let buffer = std::mem::take(&mut self.buffer);
        let export = self.exporter.export(&buffer.serialize());
        match &export {
            Ok(handle) => info!(
                path = %handle.path.display(),
                samples = buffer.len(),
                "session exported"
            ),
            Err(e) => error!(error = %e, samples = buffer.len(), "session export failed"),
        }
        self.log.record_export(export.is_ok());

        self.surface.request_exit();

        Ok(StopReport {
            readings: buffer.into_readings(),
            export,
        })
    }

    /// Handle one event from the event loop.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Dispatch, SessionError> {
        let result = match event {
            SessionEvent::Start { interval_secs } => {
                self.start(interval_secs).map(|_| Dispatch::Continue)
            }
            SessionEvent::RateChanged { rate } => {
                self.on_rate_changed(rate);
                Ok(Dispatch::Continue)
            }
            SessionEvent::Tick => {
                self.on_tick();
                Ok(Dispatch::Continue)
            }
            SessionEvent::Stop => self.stop().map(Dispatch::Finished),
        };

        if let Err(e) = &result {
            warn!(error = %e, state = ?self.state, "session event rejected");
        }
        result
    }
}
