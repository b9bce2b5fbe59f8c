//! # symbind Utilities
//!
//! Shared logging and configuration helpers for symbind.
//!
//! This crate provides common functionality used across the symbind workspace,
//! including logging infrastructure built on `tracing` and TOML configuration
//! loading built on `serde`.

pub mod config;
pub mod logging;

pub use config::{ConfigError, LoggingConfig, load_config};
// Re-export commonly used logging functions for convenience
pub use logging::{
    LogFormat, LogLevel, LoggingError, LoggingGuard, init_logging, init_logging_to, init_logging_with_level,
};
pub use tracing::{debug, error, info, trace, warn};
