//! Recurring capture timer.

use crossbeam_channel::{never, tick, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A periodic tick source that can be disarmed exactly once.
///
/// Ticks are delivered on a crossbeam channel; a tick that was already
/// delivered but is handled after [`CaptureTimer::disarm`] must be dropped
/// by checking [`CaptureTimer::is_armed`].
pub struct CaptureTimer {
    armed: AtomicBool,
    ticks: Receiver<Instant>,
}

impl CaptureTimer {
    /// Arm a timer that fires every `period`.
    pub fn arm(period: Duration) -> Self {
        Self {
            armed: AtomicBool::new(true),
            ticks: tick(period),
        }
    }

    /// False once [`CaptureTimer::disarm`] has run.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Check-and-clear. Returns true only for the call that disarmed the timer.
    pub fn disarm(&self) -> bool {
        self.armed.swap(false, Ordering::SeqCst)
    }

    /// Tick receiver, or a channel that never fires once disarmed.
    pub fn ticks(&self) -> Receiver<Instant> {
        if self.is_armed() {
            self.ticks.clone()
        } else {
            never()
        }
    }
}
