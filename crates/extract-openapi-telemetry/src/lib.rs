//! Logging infrastructure for extract-openapi.
//!
//! This crate provides:
//! - Structured logging to stderr, JSON or pretty
//! - Standard event names and `log_*!` macros for consistent fields
//!
//! # Usage
//!
//! ```ignore
//! use extract_openapi_telemetry::{LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Json);
//!
//! extract_openapi_telemetry::init(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, LoggingConfig};
pub use logging::{events, init_logging as init};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The configured log level is not a valid filter directive.
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),
}
