//! Single-threaded session event loop.
//!
//! All session work happens here, one event at a time. Producers (rate
//! source, user input, Ctrl+C) only send on channels:
//!
//! ```text
//!  rate source ──RateChanged──┐
//!  Ctrl+C ───────Stop─────────┼──▶ select! ──▶ SessionController
//!  stdin ────────line─────────┤        ▲
//!  capture timer ──tick───────┘        │ one event at a time
//! ```
//!
//! A typed line is the toggle control: while idle it is the interval (an
//! empty line uses the configured default), while running any line stops the
//! session.

use crate::export::Exporter;
use crate::session::{
    Affordance, ControlSurface, Dispatch, Interval, Reading, SessionController, SessionEvent,
    StopReport,
};
use crossbeam_channel::{never, select, unbounded, Receiver};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// How the event loop ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A session ran and was exported (successfully or not)
    Completed(StopReport),
    /// Stopped before any session was started
    Abandoned,
}

/// Drives a [`SessionController`] from its event sources.
pub struct SessionRuntime<E: Exporter, S: ControlSurface> {
    controller: SessionController<E, S>,
    events: Receiver<SessionEvent>,
    input: Receiver<String>,
    default_interval: Interval,
}

impl<E: Exporter, S: ControlSurface> SessionRuntime<E, S> {
    /// `default_interval` is used when the user submits an empty line.
    pub fn new(
        controller: SessionController<E, S>,
        events: Receiver<SessionEvent>,
        input: Receiver<String>,
        default_interval: Interval,
    ) -> Self {
        Self {
            controller,
            events,
            input,
            default_interval,
        }
    }

    /// Run until the session is stopped or every event source has closed.
    ///
    /// With `interval_secs` the session starts immediately; an invalid value
    /// is returned as an error before anything is armed.
    pub fn run(mut self, interval_secs: Option<i64>) -> anyhow::Result<SessionOutcome> {
        match interval_secs {
            Some(secs) => self.controller.start(secs)?,
            None => self.controller.present(),
        }

        let mut events_open = true;
        let mut input_open = true;

        loop {
            let events = if events_open { self.events.clone() } else { never() };
            let input = if input_open { self.input.clone() } else { never() };
            let ticks = self.controller.ticks();
            let event = select! {
                recv(events) -> msg => match msg {
                    Ok(event) => event,
                    Err(_) => {
                        events_open = false;
                        if input_open {
                            continue;
                        }
                        self.on_sources_closed()
                    }
                },
                recv(input) -> msg => match msg {
                    Ok(line) => match self.translate_input(&line) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(_) => {
                        input_open = false;
                        if events_open {
                            continue;
                        }
                        self.on_sources_closed()
                    }
                },
                recv(ticks) -> _ => SessionEvent::Tick,
            };

            if event == SessionEvent::Stop && self.controller.state().is_idle() {
                info!("stopped before a session was started");
                return Ok(SessionOutcome::Abandoned);
            }

            match self.controller.dispatch(event) {
                Ok(Dispatch::Continue) => {}
                Ok(Dispatch::Finished(report)) => return Ok(SessionOutcome::Completed(report)),
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    /// Map a line of user input onto the toggle.
    fn translate_input(&self, line: &str) -> Option<SessionEvent> {
        if !self.controller.state().is_idle() {
            return Some(SessionEvent::Stop);
        }

        if line.trim().is_empty() {
            return Some(SessionEvent::Start {
                interval_secs: self.default_interval.secs() as i64,
            });
        }

        match Interval::parse(line) {
            Ok(interval) => Some(SessionEvent::Start {
                interval_secs: interval.secs() as i64,
            }),
            Err(e) => {
                warn!(input = line.trim(), "rejected interval input");
                eprintln!("{e}");
                None
            }
        }
    }

    /// Nothing can stop the session any more, so stop it now.
    fn on_sources_closed(&self) -> SessionEvent {
        warn!("all event sources closed");
        SessionEvent::Stop
    }
}

/// Terminal rendition of the screen.
pub struct ConsoleSurface {
    exit_requested: Arc<AtomicBool>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self {
            exit_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag the binary checks after the loop returns.
    pub fn exit_flag(&self) -> Arc<AtomicBool> {
        self.exit_requested.clone()
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSurface for ConsoleSurface {
    fn show_affordance(&mut self, affordance: Affordance) {
        match affordance {
            Affordance::Start => {
                println!("Enter a capture interval in seconds and press Enter to START");
            }
            Affordance::Stop => {
                println!("Recording. Press Enter (or Ctrl+C) to STOP and export");
            }
        }
        let _ = std::io::stdout().flush();
    }

    fn show_reading(&mut self, reading: Reading) {
        println!(
            "[{}] {} bpm",
            chrono::Local::now().format("%H:%M:%S"),
            if reading.is_no_signal() {
                "--".to_string()
            } else {
                reading.to_string()
            }
        );
    }

    fn request_exit(&mut self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }
}

/// Forward stdin lines on a channel from a background thread.
pub fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = std::thread::Builder::new()
        .name("hr-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not read user input");
    }
    rx
}
