//! OpenTelemetry tracing driven by the observability configuration.
//!
//! Maps the configured [`SamplingStrategy`] onto an OpenTelemetry sampler
//! and the configured project and custom tags onto resource attributes,
//! then installs an OTLP-exporting tracer provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use callwatch_telemetry::tracing::{TracingSettings, build_tracer_provider};
//!
//! let config = callwatch_config::ConfigLoader::new().load()?;
//! let provider = build_tracer_provider(&config, &TracingSettings::default())?;
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use callwatch_config::{ObservabilityConfig, SamplingStrategy};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;

/// Resource attribute carrying the destination project id.
pub const PROJECT_ID_ATTRIBUTE: &str = "gcp.project_id";

/// Exporter settings that do not come from the observability configuration.
#[derive(Debug, Clone)]
pub struct TracingSettings {
    /// Service name for spans.
    pub service_name: String,

    /// Service version.
    pub service_version: String,

    /// OTLP endpoint (e.g., `http://localhost:4317`).
    pub otlp_endpoint: String,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            service_name: "callwatch-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
        }
    }
}

/// Returns the OpenTelemetry sampler for a sampling strategy.
pub fn sampler_for(strategy: SamplingStrategy) -> Sampler {
    match strategy {
        SamplingStrategy::Never => Sampler::AlwaysOff,
        SamplingStrategy::Always => Sampler::AlwaysOn,
        SamplingStrategy::Probabilistic(rate) => Sampler::TraceIdRatioBased(rate),
    }
}

/// Builds the resource attached to every exported span.
///
/// Custom tags are added last and may not override the service attributes.
pub fn resource_for(config: &ObservabilityConfig, settings: &TracingSettings) -> Resource {
    let mut attributes = vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::attribute::SERVICE_NAME,
            settings.service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::attribute::SERVICE_VERSION,
            settings.service_version.clone(),
        ),
    ];

    if let Some(project) = config.destination_project_id() {
        attributes.push(KeyValue::new(PROJECT_ID_ATTRIBUTE, project.to_string()));
    }

    if let Some(tags) = config.custom_tags() {
        let reserved = [
            opentelemetry_semantic_conventions::attribute::SERVICE_NAME,
            opentelemetry_semantic_conventions::attribute::SERVICE_VERSION,
            PROJECT_ID_ATTRIBUTE,
        ];
        attributes.extend(
            tags.iter()
                .filter(|(key, _)| !reserved.contains(&key.as_str()))
                .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
        );
    }

    Resource::new(attributes)
}

/// Builds a tracer provider from the observability configuration without
/// installing it.
///
/// Must be called from within a Tokio runtime when cloud tracing is
/// enabled: spans are exported by a batch processor running on it.
///
/// # Returns
///
/// `None` when cloud tracing is disabled, otherwise a `TracerProvider` using
/// the configured sampler and resource.
///
/// # Errors
///
/// Returns `TelemetryError::TracingInit` if the exporter cannot be built.
pub fn build_tracer_provider(
    config: &ObservabilityConfig,
    settings: &TracingSettings,
) -> TelemetryResult<Option<TracerProvider>> {
    if !config.cloud_tracing_enabled() {
        return Ok(None);
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.otlp_endpoint)
        .build()
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_sampler(sampler_for(config.sampling()))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource_for(config, settings))
        .build();

    Ok(Some(provider))
}

/// Initializes tracing from the observability configuration.
///
/// Builds the provider with [`build_tracer_provider`] and installs it as the
/// global tracer provider.
///
/// # Errors
///
/// Returns `TelemetryError::TracingInit` if the exporter cannot be built.
pub fn init_tracing(
    config: &ObservabilityConfig,
    settings: &TracingSettings,
) -> TelemetryResult<Option<TracerProvider>> {
    let provider = build_tracer_provider(config, settings)?;
    if let Some(provider) = &provider {
        global::set_tracer_provider(provider.clone());
    }
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{Span, Tracer, TracerProvider as _};
    use opentelemetry::{Key, Value};

    #[test]
    fn test_sampler_mapping() {
        assert!(matches!(
            sampler_for(SamplingStrategy::Never),
            Sampler::AlwaysOff
        ));
        assert!(matches!(
            sampler_for(SamplingStrategy::Always),
            Sampler::AlwaysOn
        ));
        assert!(matches!(
            sampler_for(SamplingStrategy::Probabilistic(0.25)),
            Sampler::TraceIdRatioBased(rate) if rate == 0.25
        ));
    }

    #[test]
    fn test_sampler_from_parsed_config() {
        let config = ObservabilityConfig::from_json_str(
            r#"{"enable_cloud_trace": true, "global_trace_sampling_rate": 1.0}"#,
        )
        .unwrap();
        assert!(matches!(sampler_for(config.sampling()), Sampler::AlwaysOn));
    }

    #[test]
    fn test_resource_includes_project_and_tags() {
        let config = ObservabilityConfig::from_json_str(
            r#"{
                "destination_project_id": "grpc-testing",
                "custom_tags": {"region": "us-east1", "service.name": "spoofed"}
            }"#,
        )
        .unwrap();
        let settings = TracingSettings {
            service_name: "payments".to_string(),
            ..Default::default()
        };

        let resource = resource_for(&config, &settings);

        assert_eq!(
            resource.get(Key::from_static_str("service.name")),
            Some(Value::from("payments"))
        );
        assert_eq!(
            resource.get(Key::from_static_str(PROJECT_ID_ATTRIBUTE)),
            Some(Value::from("grpc-testing"))
        );
        assert_eq!(
            resource.get(Key::from_static_str("region")),
            Some(Value::from("us-east1"))
        );
    }

    #[test]
    fn test_resource_without_optional_fields() {
        let resource = resource_for(&ObservabilityConfig::default(), &TracingSettings::default());
        assert!(resource
            .get(Key::from_static_str(PROJECT_ID_ATTRIBUTE))
            .is_none());
        assert_eq!(resource.len(), 2);
    }

    #[test]
    fn test_disabled_tracing() {
        let config = ObservabilityConfig::default();
        let result = init_tracing(&config, &TracingSettings::default());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_invalid_endpoint_fails() {
        let config = ObservabilityConfig::from_json_str(r#"{"enable_cloud_trace": true}"#).unwrap();
        let settings = TracingSettings {
            otlp_endpoint: "not a uri \0".to_string(),
            ..Default::default()
        };

        let err = build_tracer_provider(&config, &settings).unwrap_err();
        assert!(matches!(err, TelemetryError::TracingInit(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enabled_provider_uses_configured_sampler() {
        let config = ObservabilityConfig::from_json_str(
            r#"{"enable_cloud_trace": true, "global_trace_sampling_rate": 0.0}"#,
        )
        .unwrap();

        let provider = build_tracer_provider(&config, &TracingSettings::default())
            .unwrap()
            .expect("tracing is enabled");

        // The SDK default samples every root span; a zero rate samples none.
        let tracer = provider.tracer("callwatch-test");
        let mut span = tracer.start("rpc");
        assert!(!span.span_context().is_sampled());
        span.end();

        let _ = provider.shutdown();
    }
}
