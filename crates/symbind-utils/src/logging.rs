//! # Logging
//!
//! Installs the global `tracing` subscriber for the symbind binary. Library
//! crates only emit events; this is the one place that decides where they go.
//!
//! A console layer (pretty, compact or JSON) is always present. A second
//! layer writing to a daily-rolling file is added when a log file is named.
//!
//! Console output goes to stderr so generated text and query results on
//! stdout stay clean.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symbind_utils::init_logging;
//!
//! // The file layer lives as long as the guard
//! let _guard = init_logging().expect("logging");
//! tracing::info!("ready");
//! ```
//!
//! ## Environment
//!
//! | variable | meaning | default |
//! |----------|---------|---------|
//! | `RUST_LOG` | filter directives, e.g. `symbind_core=trace` | `info` |
//! | `SYMBIND_LOG_FORMAT` | `pretty`, `compact` or `json` | `pretty` |
//! | `SYMBIND_LOG_FILE` | path of a log file | none |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "SYMBIND_LOG_FORMAT";

/// Environment variable naming a log file
pub const LOG_FILE_ENV: &str = "SYMBIND_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Multi-line, human-readable format (default)
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err>
    {
        const NAMES: [(&str, LogFormat); 3] = [
            ("pretty", LogFormat::Pretty),
            ("compact", LogFormat::Compact),
            ("json", LogFormat::Json),
        ];
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value.trim()))
            .map(|(_, format)| *format)
            .ok_or_else(|| LoggingError::UnknownFormat(value.to_owned()))
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Info level (default)
    #[default]
    Info,
    Debug,
    /// Most verbose
    Trace,
}

impl LogLevel
{
    #[must_use]
    pub const fn tracing_level(self) -> Level
    {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    /// Accepts any spelling `tracing` accepts, `warning` included
    fn from_str(value: &str) -> Result<Self, Self::Err>
    {
        let level = match value.trim().to_ascii_lowercase().as_str() {
            "warning" => Level::WARN,
            other => other
                .parse::<Level>()
                .map_err(|_| LoggingError::UnknownLevel(value.to_owned()))?,
        };
        const LEVELS: [LogLevel; 5] = [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug, LogLevel::Trace];
        Ok(LEVELS
            .into_iter()
            .find(|candidate| candidate.tracing_level() == level)
            .unwrap_or(Self::Trace))
    }
}

/// Keeps the non-blocking file writer running
///
/// Dropping it flushes and stops file logging; console logging is unaffected.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Install the subscriber configured by `RUST_LOG`, `SYMBIND_LOG_FORMAT`
/// and `SYMBIND_LOG_FILE`
///
/// ## Errors
///
/// An unknown format name, or a subscriber that is already installed.
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::Pretty,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));
    install(format, filter, env::var(LOG_FILE_ENV).ok().map(PathBuf::from).as_deref())
}

/// Like [`init_logging`] with the level and format fixed by the caller
///
/// ## Errors
///
/// Fails when a subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let file = env::var(LOG_FILE_ENV).ok().map(PathBuf::from);
    init_logging_to(level, format, file.as_deref())
}

/// Nothing is read from the environment
///
/// ## Errors
///
/// Fails when a subscriber is already installed.
pub fn init_logging_to(level: LogLevel, format: LogFormat, file: Option<&Path>) -> Result<LoggingGuard, LoggingError>
{
    install(format, EnvFilter::new(level.tracing_level().to_string()), file)
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    let timer = ChronoUtc::rfc_3339();
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer)
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, path: &Path) -> (BoxedLayer, WorkerGuard)
{
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let appender = tracing_appender::rolling::daily(directory, path.file_name().unwrap_or_default());
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let timer = ChronoUtc::rfc_3339();
    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty | LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_ansi(false)
            .with_filter(filter)
            .boxed(),
    };
    (layer, guard)
}

fn install(format: LogFormat, filter: EnvFilter, file: Option<&Path>) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![console_layer(format, filter.clone())];
    let mut guard = None;
    if let Some(path) = file {
        let (layer, worker) = file_layer(format, filter, path);
        layers.push(layer);
        guard = Some(worker);
    }

    Registry::default().with(layers).try_init()?;
    Ok(LoggingGuard { _file: guard })
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("unknown log format {0:?} (expected pretty, compact or json)")]
    UnknownFormat(String),

    #[error("unknown log level {0:?} (expected error, warn, info, debug or trace)")]
    UnknownLevel(String),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_format_names_ignore_case()
    {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        match "yaml".parse::<LogFormat>() {
            Err(LoggingError::UnknownFormat(name)) => assert_eq!(name, "yaml"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_level_names()
    {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!(matches!("verbose".parse::<LogLevel>(), Err(LoggingError::UnknownLevel(_))));
    }

    #[test]
    fn test_levels_map_onto_tracing()
    {
        assert_eq!(LogLevel::Warn.tracing_level(), Level::WARN);
        assert_eq!(LogLevel::Trace.tracing_level(), Level::TRACE);
        assert_eq!(LogLevel::default().tracing_level(), Level::INFO);
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
