//! Runtime configuration
//!
//! Resolution order, lowest priority first:
//! 1. Built-in defaults
//! 2. Config file (explicit path, else `<data dir>/tally/config.toml` if present)
//! 3. `TALLY_DB` environment variable
//!
//! Command-line flags are applied on top by the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "TALLY_DB";

const DEFAULT_DB_PATH: &str = "tally.db";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Maximum pooled connections
    pub pool_size: u32,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    database: Option<RawDatabase>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDatabase {
    path: Option<PathBuf>,
    pool_size: Option<u32>,
    busy_timeout_ms: Option<u64>,
}

impl Config {
    /// Load config from file and environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = match override_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            if !db_path.trim().is_empty() {
                config.db_path = PathBuf::from(db_path);
            }
        }

        Ok(config)
    }

    /// Read a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse config from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();
        if let Some(db) = raw.database {
            if let Some(path) = db.path {
                config.db_path = path;
            }
            if let Some(size) = db.pool_size {
                if size == 0 {
                    return Err(Error::Config("pool_size must be at least 1".to_string()));
                }
                config.pool_size = size;
            }
            if let Some(ms) = db.busy_timeout_ms {
                config.busy_timeout = Duration::from_millis(ms);
            }
        }

        Ok(config)
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config.toml"))
}
