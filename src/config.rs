//! Configuration for the heart-rate recorder.

use crate::export::{ArtifactEncoding, MIN_EXPORT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture interval used when the user submits an empty interval
    pub default_interval_secs: u64,

    /// Directory that receives exported session artifacts
    pub export_path: PathBuf,

    /// Fixed prefix of every artifact file name
    pub artifact_prefix: String,

    /// Fixed extension of every artifact file name (including the dot)
    pub artifact_extension: String,

    /// How the joined samples are encoded on disk
    pub encoding: ArtifactEncoding,

    /// Upper bound on how long termination waits for the export write
    #[serde(with = "duration_serde")]
    pub export_timeout: Duration,

    /// How often the simulated sensor publishes a new rate (milliseconds)
    pub rate_period_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-hr");

        Self {
            default_interval_secs: 5,
            export_path: data_dir.join("exports"),
            artifact_prefix: "hr_session_".to_string(),
            artifact_extension: ".txt".to_string(),
            encoding: ArtifactEncoding::JsonString,
            export_timeout: Duration::from_secs(10),
            rate_period_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-hr")
            .join("config.json")
    }

    /// Ensure the export directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Period of the simulated rate source.
    pub fn rate_period(&self) -> Duration {
        Duration::from_millis(self.rate_period_ms.max(1))
    }

    /// Export wait, raised to [`MIN_EXPORT_TIMEOUT`] when configured lower.
    pub fn export_wait(&self) -> Duration {
        self.export_timeout.max(MIN_EXPORT_TIMEOUT)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, stored as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_interval_secs, 5);
        assert_eq!(config.artifact_prefix, "hr_session_");
        assert_eq!(config.artifact_extension, ".txt");
        assert_eq!(config.encoding, ArtifactEncoding::JsonString);
        assert_eq!(config.export_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.default_interval_secs, 5);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.default_interval_secs = 30;
        config.encoding = ArtifactEncoding::Plain;
        config.export_timeout = Duration::from_secs(3);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_interval_secs, 30);
        assert_eq!(loaded.encoding, ArtifactEncoding::Plain);
        assert_eq!(loaded.export_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "default_interval_secs": 2 }"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_interval_secs, 2);
        assert_eq!(loaded.artifact_prefix, "hr_session_");
    }

    #[test]
    fn test_zero_export_timeout_is_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "export_timeout": 0, "rate_period_ms": 0 }"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.export_timeout, Duration::ZERO);
        assert_eq!(loaded.export_wait(), MIN_EXPORT_TIMEOUT);
        assert_eq!(loaded.rate_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
