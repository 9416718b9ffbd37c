//! Synheart HR CLI
//!
//! Records one heart-rate sampling session per run.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::{unbounded, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use synheart_hr::{
    config::Config,
    decode_artifact,
    export::{list_artifacts, ArtifactEncoding, ExportError, FileExporter},
    runtime::{spawn_input_reader, ConsoleSurface, SessionOutcome, SessionRuntime},
    session::{Interval, SessionController, SessionEvent},
    source::{RateSource, ReplaySource, SimulatedConfig, SimulatedSource},
    transparency::create_shared_log,
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-hr")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Heart-rate sampling session recorder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Synthetic wrist sensor
    Simulated,
    /// Rates read from --replay-file
    Replay,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one sampling session, export it and exit
    Record {
        /// Seconds between captures (prompted for when omitted)
        #[arg(long, short, allow_negative_numbers = true)]
        interval: Option<i64>,

        /// Heart-rate source
        #[arg(long, value_enum, default_value = "simulated")]
        source: SourceKind,

        /// File with one rate per line (for --source replay)
        #[arg(long)]
        replay_file: Option<PathBuf>,

        /// Milliseconds between published rates (overrides config)
        #[arg(long)]
        rate_period_ms: Option<u64>,

        /// Export directory (overrides config)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write samples without JSON string quoting
        #[arg(long)]
        plain: bool,
    },

    /// Decode an exported session and summarize it
    Inspect {
        /// Artifact to read
        file: PathBuf,

        /// Artifact was written with --plain
        #[arg(long)]
        plain: bool,
    },

    /// List exported sessions
    List {
        /// Directory to list (defaults to the configured export path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Display the data handling declaration
    Privacy,

    /// Show configuration
    Config,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Record {
            interval,
            source,
            replay_file,
            rate_period_ms,
            output,
            plain,
        } => cmd_record(interval, source, replay_file, rate_period_ms, output, plain),
        Commands::Inspect { file, plain } => cmd_inspect(&file, plain).map(|_| 0),
        Commands::List { output } => cmd_list(output).map(|_| 0),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(0)
        }
        Commands::Config => {
            cmd_config();
            Ok(0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("synheart_hr=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config ({e}), using defaults");
        Config::default()
    })
}

fn cmd_record(
    interval: Option<i64>,
    source_kind: SourceKind,
    replay_file: Option<PathBuf>,
    rate_period_ms: Option<u64>,
    output: Option<PathBuf>,
    plain: bool,
) -> anyhow::Result<i32> {
    let mut config = load_config();
    if let Some(dir) = output {
        config.export_path = dir;
    }
    if let Some(ms) = rate_period_ms {
        config.rate_period_ms = ms;
    }
    if plain {
        config.encoding = ArtifactEncoding::Plain;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create export directory: {e}");
    }

    let default_interval = i64::try_from(config.default_interval_secs)
        .ok()
        .and_then(|secs| Interval::from_secs(secs).ok())
        .context("default_interval_secs must be a positive number of seconds")?;

    println!("Synheart HR v{VERSION}");
    println!();
    println!("  Export directory: {:?}", config.export_path);
    println!("  Encoding: {:?}", config.encoding);
    println!();

    let (event_tx, event_rx) = unbounded();

    let mut source: Box<dyn RateSource> = match source_kind {
        SourceKind::Simulated => Box::new(SimulatedSource::new(SimulatedConfig {
            period: config.rate_period(),
            ..SimulatedConfig::default()
        })),
        SourceKind::Replay => {
            let path = replay_file.context("--source replay requires --replay-file")?;
            Box::new(ReplaySource::from_file(&path, config.rate_period())?)
        }
    };
    source.start(event_tx.clone())?;

    stop_on_ctrlc(event_tx)?;

    let log = create_shared_log();
    let surface = ConsoleSurface::new();
    let exit_requested = surface.exit_flag();
    let controller =
        SessionController::new(FileExporter::from_config(&config), surface).with_log(log.clone());

    let runtime = SessionRuntime::new(controller, event_rx, spawn_input_reader(), default_interval);
    let outcome = runtime.run(interval);
    source.stop();
    let outcome = outcome?;

    println!();
    let code = match outcome {
        SessionOutcome::Completed(report) => match report.export {
            Ok(handle) => {
                println!(
                    "Exported {} samples to {:?}",
                    report.readings.len(),
                    handle.path
                );
                0
            }
            Err(e) => {
                eprintln!("Error exporting session: {e}");
                if let ExportError::Timeout { path, .. } = &e {
                    eprintln!("The write may still complete at {path:?}");
                }
                1
            }
        },
        SessionOutcome::Abandoned => {
            println!("No session was started; nothing exported.");
            0
        }
    };

    println!();
    println!("{}", log.summary());

    if exit_requested.load(Ordering::SeqCst) {
        println!("Exiting.");
    }
    Ok(code)
}

/// Ctrl+C is the second press of the toggle.
fn stop_on_ctrlc(events: Sender<SessionEvent>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        let _ = events.send(SessionEvent::Stop);
    })
    .context("Error setting Ctrl+C handler")
}

fn cmd_inspect(file: &Path, plain: bool) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Could not read {file:?}"))?;
    let encoding = if plain {
        ArtifactEncoding::Plain
    } else {
        ArtifactEncoding::JsonString
    };
    let readings = decode_artifact(&content, encoding)?;

    println!("Session {file:?}");
    println!("  Samples: {}", readings.len());
    println!(
        "  No-signal samples: {}",
        readings.iter().filter(|r| r.is_no_signal()).count()
    );

    let signal: Vec<u32> = readings
        .iter()
        .filter(|r| !r.is_no_signal())
        .map(|r| r.bpm())
        .collect();
    if let (Some(min), Some(max)) = (signal.iter().min(), signal.iter().max()) {
        let mean = signal.iter().map(|&v| f64::from(v)).sum::<f64>() / signal.len() as f64;
        println!("  Min: {min} bpm");
        println!("  Max: {max} bpm");
        println!("  Mean: {mean:.1} bpm");
    }
    Ok(())
}

fn cmd_list(output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config();
    let dir = output.unwrap_or_else(|| config.export_path.clone());

    let artifacts = match list_artifacts(&dir, &config.artifact_prefix, &config.artifact_extension)
    {
        Ok(found) => found,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e).with_context(|| format!("Could not list {dir:?}")),
    };

    if artifacts.is_empty() {
        println!("No sessions found in {dir:?}");
        println!("Run 'synheart-hr record' to record one.");
        return Ok(());
    }

    println!("Found {} session file(s) in {:?}", artifacts.len(), dir);
    for path in artifacts {
        println!("  {}", path.display());
    }
    Ok(())
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
