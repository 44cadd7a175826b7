//! Structured logging to stderr.
//!
//! Stdout is left free for the tool's own output.

use crate::{LogFormat, LoggingConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level unless `RUST_LOG` is set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }?;

    tracing::debug!(
        service = %config.service_name,
        level = %config.log_level,
        "logging initialized"
    );
    Ok(())
}

/// Build an env filter from a level or directive string.
pub fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|_| TelemetryError::InvalidLevel(level.to_string()))
}

/// Initialize JSON logging.
fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Initialize pretty logging.
fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .pretty()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// Source document has been read and parsed.
    pub const SOURCE_LOADED: &str = "source_loaded";

    /// Remote source download is starting.
    pub const DOWNLOADING: &str = "downloading";

    /// Paths and operations have been selected.
    pub const PATHS_SELECTED: &str = "paths_selected";

    /// Unreachable schemas have been removed.
    pub const SCHEMAS_SHAKEN: &str = "schemas_shaken";

    /// Pruned document has been written.
    pub const DOCUMENT_WRITTEN: &str = "document_written";

    /// Extraction finished.
    pub const COMPLETED: &str = "completed";

    /// Extraction failed.
    pub const FAILED: &str = "failed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_source_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SOURCE_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_downloading {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOWNLOADING,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_paths_selected {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::PATHS_SELECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_schemas_shaken {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SCHEMAS_SHAKEN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_document_written {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOCUMENT_WRITTEN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_completed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPLETED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::FAILED,
            $($field)*
        )
    };
}
