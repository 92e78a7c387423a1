//! Engine configuration
//!
//! Loaded from a JSON file; every field except `data_dir` has a default.
//! Validation happens on load, before any subsystem touches the data
//! directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How the active partition's fill level is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMode {
    /// Cap on the serialized byte length of the partition
    Bytes,
    /// Cap on the number of records in the partition
    Records,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Max serialized size of a partition in bytes (default 4 MB)
    #[serde(default = "default_max_partition_bytes")]
    pub max_partition_bytes: u64,

    /// Max record count per partition, used in `records` mode (default 1000)
    #[serde(default = "default_max_partition_records")]
    pub max_partition_records: u64,

    /// Partition fill measurement mode (default `bytes`)
    #[serde(default = "default_partition_mode")]
    pub partition_mode: PartitionMode,
}

fn default_max_partition_bytes() -> u64 {
    4_000_000
}
fn default_max_partition_records() -> u64 {
    1000
}
fn default_partition_mode() -> PartitionMode {
    PartitionMode::Bytes
}

impl Config {
    /// Creates a config with default caps for the given data directory
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_partition_bytes: default_max_partition_bytes(),
            max_partition_records: default_max_partition_records(),
            partition_mode: default_partition_mode(),
        }
    }

    /// Loads and validates configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::io(format!("failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid(format!("invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates field values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.is_empty() {
            return Err(ConfigError::invalid("data_dir must not be empty"));
        }
        if self.max_partition_bytes == 0 {
            return Err(ConfigError::invalid("max_partition_bytes must be > 0"));
        }
        if self.max_partition_records == 0 {
            return Err(ConfigError::invalid("max_partition_records must be > 0"));
        }
        Ok(())
    }

    /// Root data directory
    pub fn root_dir(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Directory holding partition and table files
    pub fn data_path(&self) -> PathBuf {
        self.root_dir().join("data")
    }

    /// Directory holding ephemeral spool files
    pub fn tmp_path(&self) -> PathBuf {
        self.root_dir().join("tmp")
    }

    /// Path of the catalog file
    pub fn metadata_path(&self) -> PathBuf {
        self.root_dir().join("metadata.json")
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// Config file could not be read
    Io,
    /// Config file content is invalid
    Invalid,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::Io => "STRATA_CONFIG_IO",
            ConfigErrorCode::Invalid => "STRATA_CONFIG_INVALID",
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::Io,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::Invalid,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}
