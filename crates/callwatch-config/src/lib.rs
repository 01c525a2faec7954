//! Observability configuration for callwatch.
//!
//! This crate turns a JSON document into a strongly-typed, validated
//! [`ObservabilityConfig`] that governs RPC call logging, monitoring and
//! tracing:
//! - Source resolution from two environment variables (file path or inline JSON)
//! - Strict validation: a present field with the wrong shape is an error, never a default
//! - Derived trace [`SamplingStrategy`] from an optional probability
//! - Closed [`EventType`] enumeration with rejection of unknown names
//!
//! # Example
//!
//! ```no_run
//! use callwatch_config::ConfigLoader;
//!
//! # fn main() -> Result<(), callwatch_config::ConfigError> {
//! // Reads GRPC_CONFIG_OBSERVABILITY_JSON, falling back to GRPC_CONFIG_OBSERVABILITY
//! let config = ConfigLoader::new().load()?;
//!
//! println!("cloud logging enabled: {}", config.cloud_logging_enabled());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Format
//!
//! All keys are optional:
//!
//! ```json
//! {
//!   "enable_cloud_logging": true,
//!   "enable_cloud_monitoring": false,
//!   "enable_cloud_trace": true,
//!   "destination_project_id": "my-project",
//!   "flush_message_count": 1000,
//!   "log_filters": [{"pattern": "*", "header_bytes": 4096, "message_bytes": 4096}],
//!   "event_types": ["GRPC_CALL_REQUEST_HEADER", "GRPC_CALL_TRAILER"],
//!   "global_trace_sampling_rate": 0.5,
//!   "custom_tags": {"environment": "staging"}
//! }
//! ```
//!
//! # Failure Policy
//!
//! Loading is all-or-nothing. Absent keys keep their defaults (flags off,
//! optional values unset, sampling never), but any key that is present with
//! the wrong type, out of range, or naming an unknown event type fails the
//! whole load with a [`ConfigError`] identifying the field.

#![warn(missing_docs)]

mod config;
mod error;
mod extract;
mod loader;
mod schema;

pub use config::{global, install_global, ObservabilityConfig};
pub use error::{ConfigError, ConfigErrorKind};
pub use loader::{ConfigLoader, ConfigSource, Env, CONFIG_ENV_VAR, CONFIG_FILE_ENV_VAR};
pub use schema::{EventType, LogFilter, SamplingStrategy, SAMPLING_EPSILON};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(!config.cloud_logging_enabled());
        assert_eq!(config.sampling(), SamplingStrategy::Never);
    }

    #[test]
    fn test_install_global_once() {
        let config = ObservabilityConfig::from_json_str(r#"{"enable_cloud_trace": true}"#).unwrap();
        let installed = install_global(config).unwrap();
        assert!(installed.cloud_tracing_enabled());
        assert!(std::ptr::eq(installed, global().unwrap()));

        let err = install_global(ObservabilityConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ConfigErrorKind::State);
        assert!(global().unwrap().cloud_tracing_enabled());
    }
}
