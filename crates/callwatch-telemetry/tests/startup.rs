//! Integration tests for observability bring-up.
//!
//! Bring-up installs process-wide state, so the successful path is exercised
//! exactly once in this binary.

use callwatch_config::{ConfigLoader, Env, EventType, SamplingStrategy, CONFIG_ENV_VAR};
use callwatch_telemetry::{init_observability, LogConfig, TelemetryError, TracingSettings};

#[test]
fn test_init_installs_config_once() {
    let loader = ConfigLoader::with_env(Env::from_pairs([(
        CONFIG_ENV_VAR,
        r#"{
            "enable_cloud_logging": true,
            "event_types": ["GRPC_CALL_REQUEST_MESSAGE", "GRPC_CALL_RESPONSE_MESSAGE"],
            "global_trace_sampling_rate": 0.5
        }"#,
    )]));
    let log = LogConfig {
        enabled: false,
        ..LogConfig::default()
    };

    let guard = init_observability(&loader, &log, &TracingSettings::default()).unwrap();

    assert!(guard.config().cloud_logging_enabled());
    assert!(!guard.tracing_active());
    assert_eq!(
        guard.config().event_types().unwrap(),
        &[EventType::RequestMessage, EventType::ResponseMessage]
    );
    assert_eq!(
        callwatch_config::global().unwrap().sampling(),
        SamplingStrategy::Probabilistic(0.5)
    );

    // No update path: a second bring-up is rejected and the first value kept.
    let second = ConfigLoader::with_env(Env::from_pairs([(CONFIG_ENV_VAR, "{}")]));
    let err = init_observability(&second, &log, &TracingSettings::default())
        .err()
        .unwrap();
    assert!(matches!(err, TelemetryError::Config(_)));
    assert!(callwatch_config::global().unwrap().cloud_logging_enabled());

    drop(guard);
}
