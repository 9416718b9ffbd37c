//! Synheart HR - heart-rate sampling sessions for wearable research.
//!
//! A session samples the most recent heart-rate value on a fixed interval,
//! keeps every sample in capture order, and writes them out once when the
//! session is stopped, just before the application exits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Synheart HR                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Rate Source │──▶│   Session   │──▶│  Exporter   │       │
//! │  │ (sim/replay)│   │ Controller  │   │   (file)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                      ▲        │                             │
//! │              ticks ──┘        ▼                             │
//! │                        ┌─────────────┐                      │
//! │                        │Sample Buffer│                      │
//! │                        └─────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_hr::export::FileExporter;
//! use synheart_hr::runtime::ConsoleSurface;
//! use synheart_hr::session::SessionController;
//!
//! let exporter = FileExporter::new("/tmp/hr-exports");
//! let mut controller = SessionController::new(exporter, ConsoleSurface::new());
//!
//! controller.on_rate_changed(72.0);
//! controller.start(5).expect("valid interval");
//! controller.on_tick();
//! let report = controller.stop().expect("session was running");
//! assert_eq!(report.readings.len(), 1);
//! ```

pub mod config;
pub mod export;
pub mod runtime;
pub mod session;
pub mod source;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use export::{
    decode_artifact, ArtifactEncoding, ArtifactHandle, ExportError, Exporter, FileExporter,
};
pub use runtime::{ConsoleSurface, SessionOutcome, SessionRuntime};
pub use session::{
    ControlSurface, Interval, Reading, SampleBuffer, SessionController, SessionError,
    SessionEvent, SessionState, StopReport,
};
pub use source::{RateSource, ReplaySource, SimulatedConfig, SimulatedSource, SourceError};
pub use transparency::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data handling declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              SYNHEART HR - DATA HANDLING DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This recorder samples your heart rate for research.             ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • Your heart rate in beats per minute, once per interval      ║
║    • A 0 whenever the sensor has no signal                       ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Timestamps, location or device identifiers                  ║
║    • Anything between capture ticks                              ║
║    • History from previous sessions                              ║
║                                                                  ║
║  Samples stay in memory until you stop the session, then they    ║
║  are written once to a single local file. Nothing is uploaded.   ║
║                                                                  ║
║  List your recorded sessions anytime with:                       ║
║    synheart-hr list                                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
