//! Process diagnostics logging.
//!
//! This module sets up the `tracing-subscriber` pipeline that carries the
//! library's own diagnostics (configuration source, validation failures,
//! exporter setup). It is independent of the cloud logging of RPC calls,
//! which is governed by
//! [`ObservabilityConfig::cloud_logging_enabled`](callwatch_config::ObservabilityConfig::cloud_logging_enabled).
//!
//! # Example
//!
//! ```rust,ignore
//! use callwatch_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!("diagnostics online");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive used when `RUST_LOG` is not set (e.g. "info",
    /// "callwatch_config=debug").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }

    /// Builds the filter: `RUST_LOG` when set, otherwise `level`.
    fn filter(&self) -> TelemetryResult<EnvFilter> {
        self.filter_with(std::env::var(EnvFilter::DEFAULT_ENV).ok())
    }

    /// Builds the filter from an explicit override directive.
    ///
    /// An override that does not parse is an error rather than a silent
    /// fallback to `level`.
    fn filter_with(&self, directive: Option<String>) -> TelemetryResult<EnvFilter> {
        match directive.filter(|d| !d.trim().is_empty()) {
            Some(directive) => EnvFilter::try_new(&directive).map_err(|e| {
                TelemetryError::LoggingInit(format!(
                    "Invalid {} directive {directive:?}: {e}",
                    EnvFilter::DEFAULT_ENV
                ))
            }),
            None => create_env_filter(&self.level),
        }
    }
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter or a `RUST_LOG`
/// override is invalid, or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        fmt_layer.json().with_filter(filter).boxed()
    } else {
        fmt_layer.pretty().with_filter(filter).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}
