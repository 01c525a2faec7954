//! Observability bring-up for callwatch services.
//!
//! This crate consumes the validated configuration produced by
//! `callwatch-config` and wires it into the observability stack:
//!
//! - **Logging**: Structured diagnostics via `tracing-subscriber`
//! - **Tracing**: OpenTelemetry with OTLP export, sampled per the configured strategy
//!
//! # Startup
//!
//! ```text
//!  GRPC_CONFIG_OBSERVABILITY_JSON ─┐
//!                                  ├─► ConfigLoader ─► ObservabilityConfig ─► install_global
//!  GRPC_CONFIG_OBSERVABILITY ──────┘                          │
//!                                                             ▼
//!                                          sampler_for / resource_for ─► TracerProvider
//! ```
//!
//! Startup fails closed: if the configuration cannot be loaded, nothing is
//! installed and the error is returned to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use callwatch_config::ConfigLoader;
//! use callwatch_telemetry::{init_observability, LogConfig, TracingSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_observability(
//!         &ConfigLoader::new(),
//!         &LogConfig::production(),
//!         &TracingSettings::default(),
//!     )
//!     .expect("observability configuration rejected");
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod tracing;

use callwatch_config::{ConfigLoader, ObservabilityConfig};

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use self::tracing::{
    build_tracer_provider, init_tracing, resource_for, sampler_for, TracingSettings,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Guard that shuts down telemetry providers on drop.
///
/// Keep it alive for the lifetime of the application. When dropped, pending
/// spans are flushed and the tracer provider is shut down.
pub struct ObservabilityGuard {
    config: &'static ObservabilityConfig,
    tracer_provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl ObservabilityGuard {
    /// The installed process-wide configuration.
    pub fn config(&self) -> &'static ObservabilityConfig {
        self.config
    }

    /// Whether a tracer provider was installed.
    pub fn tracing_active(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            for result in provider.force_flush() {
                if let Err(e) = result {
                    eprintln!("Error flushing tracer provider: {e}");
                }
            }
            if let Err(e) = provider.shutdown() {
                eprintln!("Error shutting down tracer provider: {e}");
            }
        }
    }
}

/// Loads the observability configuration and initializes every subsystem.
///
/// Steps, in order: diagnostics logging, configuration load, tracer
/// provider construction, global install of the configuration, global
/// install of the tracer provider. Any failure aborts bring-up and is
/// returned as is; no default configuration is substituted. A failure
/// before the configuration install leaves no global state behind, so
/// bring-up can be retried.
///
/// # Errors
///
/// Returns `TelemetryError::Config` if the configuration is unavailable,
/// unreadable, malformed, invalid or already installed, and the
/// subsystem errors of [`init_logging`] and [`build_tracer_provider`].
pub fn init_observability(
    loader: &ConfigLoader,
    log: &LogConfig,
    settings: &TracingSettings,
) -> TelemetryResult<ObservabilityGuard> {
    init_logging(log)?;

    let config = loader.load()?;
    let tracer_provider = build_tracer_provider(&config, settings)?;
    let config = callwatch_config::install_global(config)?;

    if let Some(provider) = &tracer_provider {
        opentelemetry::global::set_tracer_provider(provider.clone());
    }

    ::tracing::info!(
        tracing_active = tracer_provider.is_some(),
        "observability initialized"
    );

    Ok(ObservabilityGuard {
        config,
        tracer_provider,
    })
}
