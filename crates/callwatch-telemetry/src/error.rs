//! Telemetry error types.

use callwatch_config::ConfigError;
use thiserror::Error;

/// Errors that can occur while bringing up observability.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The observability configuration could not be loaded or installed.
    #[error("Invalid observability configuration: {0}")]
    Config(#[from] ConfigError),

    /// Failed to initialize tracing.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}
