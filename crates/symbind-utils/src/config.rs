//! # Configuration Files
//!
//! TOML configuration shared by the symbind tools.
//!
//! [`load_config`] looks in order at:
//! 1. an explicit path (which must exist)
//! 2. the file named by `SYMBIND_CONFIG`
//! 3. `./symbind.toml`, when present
//!
//! and falls back to `T::default()` when none applies.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "SYMBIND_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "symbind.toml";

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError
{
    #[error("Failed to read config {path}: {source}")]
    Read
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse
    {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig
{
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: Option<String>,
    /// `pretty`, `compact` or `json`
    pub format: Option<String>,
    pub file: Option<PathBuf>,
}

/// Parse configuration text; `origin` is only used in errors
pub fn parse_config<T: DeserializeOwned>(text: &str, origin: &Path) -> Result<T, ConfigError>
{
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })
}

/// Read and parse the configuration file at `path`
pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError>
{
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded configuration");
    parse_config(&text, path)
}

/// Which file [`load_config`] would read, if any
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf>
{
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}

/// Load configuration, falling back to defaults when no file applies
pub fn load_config<T: DeserializeOwned + Default>(explicit: Option<&Path>) -> Result<T, ConfigError>
{
    match config_path(explicit) {
        Some(path) => read_config(&path),
        None => {
            debug!("No configuration file, using defaults");
            Ok(T::default())
        }
    }
}
