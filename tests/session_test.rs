//! End-to-end tests for recording a session to disk.

use crossbeam_channel::unbounded;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use synheart_hr::session::Affordance;
use synheart_hr::{
    decode_artifact, ArtifactEncoding, ControlSurface, FileExporter, Interval, Reading,
    ReplaySource, RateSource, SessionController, SessionOutcome, SessionRuntime, SessionState,
};

/// Records what the screen was asked to do.
#[derive(Clone, Default)]
struct ScreenRecorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl ControlSurface for ScreenRecorder {
    fn show_affordance(&mut self, affordance: Affordance) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("affordance:{affordance:?}"));
    }

    fn show_reading(&mut self, reading: Reading) {
        self.calls.lock().unwrap().push(format!("reading:{reading}"));
    }

    fn request_exit(&mut self) {
        self.calls.lock().unwrap().push("exit".to_string());
    }
}

fn bpm(readings: &[Reading]) -> Vec<u32> {
    readings.iter().map(|r| r.bpm()).collect()
}

#[test]
fn test_two_ticks_at_eighty_bpm_are_exported() {
    let dir = tempfile::tempdir().unwrap();
    let screen = ScreenRecorder::default();
    let mut controller = SessionController::new(FileExporter::new(dir.path()), screen.clone());

    controller.on_rate_changed(80.0);
    controller.start(2).unwrap();
    assert!(controller.on_tick());
    assert!(controller.on_tick());

    let report = controller.stop().unwrap();
    let handle = report.export.expect("export should succeed");

    assert_eq!(std::fs::read_to_string(&handle.path).unwrap(), "\"80,80\"");
    assert_eq!(bpm(&report.readings), vec![80, 80]);
    assert_eq!(controller.state(), SessionState::Terminal);

    let calls = screen.calls.lock().unwrap();
    assert_eq!(calls.iter().filter(|c| *c == "exit").count(), 1);
    assert_eq!(calls.last().unwrap(), "exit");
}

#[test]
fn test_runtime_captures_on_real_timer() {
    let dir = tempfile::tempdir().unwrap();
    let (event_tx, event_rx) = unbounded();
    let (_input_tx, input_rx) = unbounded::<String>();

    let controller =
        SessionController::new(FileExporter::new(dir.path()), ScreenRecorder::default());
    let runtime = SessionRuntime::new(
        controller,
        event_rx,
        input_rx,
        Interval::from_secs(1).unwrap(),
    );

    event_tx
        .send(synheart_hr::SessionEvent::RateChanged { rate: 80.0 })
        .unwrap();
    let stopper = {
        let event_tx = event_tx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(2500));
            event_tx.send(synheart_hr::SessionEvent::Stop).unwrap();
        })
    };

    let outcome = runtime.run(Some(1)).unwrap();
    stopper.join().unwrap();

    match outcome {
        SessionOutcome::Completed(report) => {
            assert_eq!(bpm(&report.readings), vec![80, 80]);
            let handle = report.export.unwrap();
            let content = std::fs::read_to_string(handle.path).unwrap();
            assert_eq!(
                bpm(&decode_artifact(&content, ArtifactEncoding::JsonString).unwrap()),
                vec![80, 80]
            );
        }
        SessionOutcome::Abandoned => panic!("session should have completed"),
    }
}

#[test]
fn test_replayed_rates_reach_the_controller() {
    let dir = tempfile::tempdir().unwrap();
    let (event_tx, event_rx) = unbounded();

    let mut source = ReplaySource::parse("72\n0.5\n", Duration::from_millis(1)).unwrap();
    source.start(event_tx).unwrap();

    let mut controller = SessionController::new(
        FileExporter::new(dir.path()).with_encoding(ArtifactEncoding::Plain),
        ScreenRecorder::default(),
    );
    controller.start(1).unwrap();

    for event in event_rx.iter() {
        controller.dispatch(event).unwrap();
        controller.on_tick();
    }
    source.stop();

    let report = controller.stop().unwrap();
    let content = std::fs::read_to_string(report.export.unwrap().path).unwrap();
    assert_eq!(content, "72,0");
}

#[test]
fn test_empty_session_exports_empty_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller =
        SessionController::new(FileExporter::new(dir.path()), ScreenRecorder::default());

    controller.start(5).unwrap();
    let report = controller.stop().unwrap();

    assert!(report.readings.is_empty());
    let content = std::fs::read_to_string(report.export.unwrap().path).unwrap();
    assert_eq!(content, "\"\"");
    assert!(decode_artifact(&content, ArtifactEncoding::JsonString)
        .unwrap()
        .is_empty());
}

#[test]
fn test_export_failure_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let screen = ScreenRecorder::default();
    let mut controller =
        SessionController::new(FileExporter::new(blocker.join("out")), screen.clone());
    controller.on_rate_changed(90.0);
    controller.start(1).unwrap();
    controller.on_tick();

    let report = controller.stop().unwrap();
    assert!(report.export.is_err());
    assert_eq!(bpm(&report.readings), vec![90]);
    assert_eq!(screen.calls.lock().unwrap().last().unwrap(), "exit");
    assert_eq!(controller.log().stats().export_failures, 1);
}
