//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! ```json
//! {
//!   "verbose": true,
//!   "stream": "non_default",
//!   "max_batch_size": 4096,
//!   "cpu": { "threads": 8 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use sigbatch_backend::{CpuConfig, Stream};
use sigbatch_core::MAX_BATCH_SIZE;

use crate::error::{EngineError, Result};

/// Default records per backend call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1 << 16;

/// Configuration for the Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Log per-batch timing and throughput.
    pub verbose: bool,
    /// Stream that batch calls are submitted on.
    pub stream: Stream,
    /// Records per backend call. Larger inputs are split.
    pub max_batch_size: usize,
    /// CPU backend tuning.
    pub cpu: CpuConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            stream: Stream::Default,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            cpu: CpuConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(EngineError::Config(format!(
                "max_batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.max_batch_size
            )));
        }
        if self.cpu.threads == Some(0) {
            return Err(EngineError::Config("cpu.threads must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_json(
            r#"{"verbose": true, "stream": "non_default", "max_batch_size": 128, "cpu": {"threads": 3}}"#,
        )
        .unwrap();
        assert!(config.verbose);
        assert_eq!(config.stream, Stream::NonDefault);
        assert_eq!(config.max_batch_size, 128);
        assert_eq!(config.cpu.threads, Some(3));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"verbosity": 2}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"cpu": {"cores": 2}}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_batch_size": 0}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"cpu": {"threads": 0}}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_batch_size": 7}}"#).unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_batch_size, 7);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EngineConfig::from_path(dir.path().join("absent.json")),
            Err(EngineError::Io(_))
        ));
    }
}
