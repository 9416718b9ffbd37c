//! Session export to the local filesystem.
//!
//! Each finished session is written once, as a new file with a unique name,
//! into a fixed export directory. The joined samples are stored as a JSON
//! string literal by default, so `[72, 0, 81]` lands on disk as the bytes
//! `"72,0,81"`. Earlier artifacts use that layout and readers depend on it.

use crate::config::Config;
use crate::session::buffer::DELIMITER;
use crate::session::types::Reading;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Consumer of a finished session's serialized samples.
pub trait Exporter {
    /// Persist `serialized` as a new artifact.
    fn export(&mut self, serialized: &str) -> Result<ArtifactHandle, ExportError>;
}

/// Where an artifact was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub path: PathBuf,
    /// Bytes written to disk
    pub bytes: usize,
}

/// On-disk representation of the joined samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactEncoding {
    /// Joined text wrapped as a quoted, escaped JSON string
    #[default]
    JsonString,
    /// Joined text as-is
    Plain,
}

impl ArtifactEncoding {
    /// Encode the joined samples for writing.
    pub fn encode(self, serialized: &str) -> Result<String, ExportError> {
        match self {
            ArtifactEncoding::JsonString => serde_json::to_string(serialized)
                .map_err(|e| ExportError::Encoding(e.to_string())),
            ArtifactEncoding::Plain => Ok(serialized.to_string()),
        }
    }

    /// Undo [`ArtifactEncoding::encode`], yielding the joined samples.
    pub fn decode(self, content: &str) -> Result<String, ExportError> {
        match self {
            ArtifactEncoding::JsonString => serde_json::from_str::<String>(content.trim())
                .map_err(|e| ExportError::Encoding(e.to_string())),
            ArtifactEncoding::Plain => Ok(content.trim().to_string()),
        }
    }
}

/// Parse artifact content back into readings.
pub fn decode_artifact(
    content: &str,
    encoding: ArtifactEncoding,
) -> Result<Vec<Reading>, ExportError> {
    let joined = encoding.decode(content)?;
    if joined.is_empty() {
        return Ok(Vec::new());
    }

    joined
        .split(DELIMITER)
        .map(|field| {
            field
                .trim()
                .parse::<u32>()
                .map(Reading::from)
                .map_err(|_| ExportError::Encoding(format!("Invalid sample '{field}'")))
        })
        .collect()
}

/// Export errors. None of these stop the application from terminating.
#[derive(Debug)]
pub enum ExportError {
    /// The export directory could not be created or reached
    Unreachable(String),
    /// A file with the generated name already exists
    AlreadyExists(PathBuf),
    /// Writing the artifact failed
    Io(String),
    /// The samples could not be encoded or decoded
    Encoding(String),
    /// The write did not finish in time; the file may still appear at `path`
    Timeout { limit: Duration, path: PathBuf },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Unreachable(msg) => write!(f, "Export directory unreachable: {msg}"),
            ExportError::AlreadyExists(path) => write!(f, "Artifact already exists: {path:?}"),
            ExportError::Io(msg) => write!(f, "Export write failed: {msg}"),
            ExportError::Encoding(msg) => write!(f, "Export encoding error: {msg}"),
            ExportError::Timeout { limit, path } => write!(
                f,
                "Export to {path:?} did not complete within {}s",
                limit.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for ExportError {}

/// Shortest time an export is given to finish.
pub const MIN_EXPORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Writes artifacts into a fixed directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
    prefix: String,
    extension: String,
    encoding: ArtifactEncoding,
    timeout: Duration,
}

impl FileExporter {
    /// Exporter into `dir` with the default naming, encoding and timeout.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let defaults = Config::default();
        Self {
            dir: dir.into(),
            prefix: defaults.artifact_prefix,
            extension: defaults.artifact_extension,
            encoding: defaults.encoding,
            timeout: defaults.export_timeout,
        }
    }

    /// Exporter using the configured directory, naming, encoding and timeout.
    pub fn from_config(config: &Config) -> Self {
        Self {
            dir: config.export_path.clone(),
            prefix: config.artifact_prefix.clone(),
            extension: config.artifact_extension.clone(),
            encoding: config.encoding,
            timeout: config.export_wait(),
        }
    }

    /// Override the on-disk encoding.
    pub fn with_encoding(mut self, encoding: ArtifactEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Bound the export wait, never below [`MIN_EXPORT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(MIN_EXPORT_TIMEOUT);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A fresh file name: prefix, random v4 UUID, extension.
    pub fn artifact_name(&self) -> String {
        format!("{}{}{}", self.prefix, Uuid::new_v4().simple(), self.extension)
    }
}

impl Exporter for FileExporter {
    /// Writes on a dedicated thread and waits at most `timeout` for it.
    fn export(&mut self, serialized: &str) -> Result<ArtifactHandle, ExportError> {
        let content = self.encoding.encode(serialized)?;
        let path = self.dir.join(self.artifact_name());

        let (done_tx, done_rx) = bounded(1);
        let dir = self.dir.clone();
        let target = path.clone();
        std::thread::Builder::new()
            .name("hr-export".to_string())
            .spawn(move || {
                let _ = done_tx.send(write_new(&dir, &target, content.as_bytes()));
            })
            .map_err(|e| ExportError::Io(e.to_string()))?;

        wait_for_writer(&done_rx, self.timeout, path)
    }
}

/// Wait for the writer thread's result for at most `limit`.
fn wait_for_writer(
    done: &Receiver<Result<usize, ExportError>>,
    limit: Duration,
    path: PathBuf,
) -> Result<ArtifactHandle, ExportError> {
    match done.recv_timeout(limit) {
        Ok(result) => result.map(|bytes| ArtifactHandle { path, bytes }),
        Err(RecvTimeoutError::Timeout) => Err(ExportError::Timeout { limit, path }),
        Err(RecvTimeoutError::Disconnected) => Err(ExportError::Io(
            "export writer exited without reporting".to_string(),
        )),
    }
}

/// Create `path` (never overwriting) and write `bytes` durably.
fn write_new(dir: &Path, path: &Path, bytes: &[u8]) -> Result<usize, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Unreachable(format!("{dir:?}: {e}")))?;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => ExportError::AlreadyExists(path.to_path_buf()),
            _ => ExportError::Io(e.to_string()),
        })?;

    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| ExportError::Io(e.to_string()))?;

    Ok(bytes.len())
}

/// Artifacts in `dir` matching the naming scheme, oldest first.
pub fn list_artifacts(dir: &Path, prefix: &str, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<(std::time::SystemTime, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix) && name.ends_with(extension)
        })
        .map(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::UNIX_EPOCH);
            (modified, e.path())
        })
        .collect();

    entries.sort();
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_encoding() {
        let encoded = ArtifactEncoding::JsonString.encode("72,0,81").unwrap();
        assert_eq!(encoded, "\"72,0,81\"");
        assert_eq!(ArtifactEncoding::JsonString.encode("").unwrap(), "\"\"");
    }

    #[test]
    fn test_plain_encoding() {
        assert_eq!(ArtifactEncoding::Plain.encode("72,0,81").unwrap(), "72,0,81");
    }

    #[test]
    fn test_decode_artifact() {
        let readings = decode_artifact("\"80,0,95\"", ArtifactEncoding::JsonString).unwrap();
        let bpm: Vec<u32> = readings.iter().map(|r| r.bpm()).collect();
        assert_eq!(bpm, vec![80, 0, 95]);

        assert!(decode_artifact("\"\"", ArtifactEncoding::JsonString)
            .unwrap()
            .is_empty());
        assert!(decode_artifact("80,x", ArtifactEncoding::Plain).is_err());
        assert!(decode_artifact("80,90", ArtifactEncoding::JsonString).is_err());
    }

    #[test]
    fn test_export_writes_encoded_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FileExporter::new(dir.path());

        let handle = exporter.export("80,80").unwrap();
        assert!(handle.path.starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(&handle.path).unwrap(), "\"80,80\"");
        assert_eq!(handle.bytes, 7);
    }

    #[test]
    fn test_export_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("documents").join("hr");
        let mut exporter = FileExporter::new(&nested).with_encoding(ArtifactEncoding::Plain);

        let handle = exporter.export("61").unwrap();
        assert_eq!(std::fs::read_to_string(handle.path).unwrap(), "61");
    }

    #[test]
    fn test_artifact_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FileExporter::new(dir.path());

        let first = exporter.export("1").unwrap();
        let second = exporter.export("1").unwrap();
        assert_ne!(first.path, second.path);

        let name = first.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("hr_session_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_zero_timeout_is_raised_to_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FileExporter::new(dir.path()).with_timeout(Duration::ZERO);
        assert_eq!(exporter.timeout(), MIN_EXPORT_TIMEOUT);

        let handle = exporter.export("1,2").unwrap();
        assert_eq!(std::fs::read_to_string(handle.path).unwrap(), "\"1,2\"");

        let mut config = Config::default();
        config.export_timeout = Duration::ZERO;
        assert_eq!(FileExporter::from_config(&config).timeout(), MIN_EXPORT_TIMEOUT);
    }

    #[test]
    fn test_slow_writer_times_out() {
        let (_writer, done) = bounded::<Result<usize, ExportError>>(1);
        let path = PathBuf::from("pending.txt");

        match wait_for_writer(&done, Duration::from_millis(20), path.clone()) {
            Err(ExportError::Timeout { limit, path: pending }) => {
                assert_eq!(limit, Duration::from_millis(20));
                assert_eq!(pending, path);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_writer_result_is_returned() {
        let (writer, done) = bounded(1);
        writer.send(Ok(5)).unwrap();

        let handle = wait_for_writer(&done, Duration::from_secs(1), "a.txt".into()).unwrap();
        assert_eq!(handle.bytes, 5);

        drop(writer);
        assert!(matches!(
            wait_for_writer(&done, Duration::from_secs(1), "b.txt".into()),
            Err(ExportError::Io(_))
        ));
    }

    #[test]
    fn test_write_new_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.txt");
        std::fs::write(&path, "original").unwrap();

        let result = write_new(dir.path(), &path, b"replacement");
        assert!(matches!(result, Err(ExportError::AlreadyExists(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_unreachable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let mut exporter = FileExporter::new(blocker.join("exports"));
        assert!(matches!(
            exporter.export("70"),
            Err(ExportError::Unreachable(_))
        ));
    }

    #[test]
    fn test_list_artifacts_filters_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FileExporter::new(dir.path());
        exporter.export("70").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let found = list_artifacts(dir.path(), "hr_session_", ".txt").unwrap();
        assert_eq!(found.len(), 1);
    }
}
