//! Validated observability configuration.
//!
//! This module provides [`ObservabilityConfig`], the immutable result of
//! parsing and validating a configuration document, and the process-wide
//! slot it is installed into at startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Serialize;
use serde_json::Value;

use crate::extract::{self, Object};
use crate::{ConfigError, EventType, LogFilter, SamplingStrategy};

const ENABLE_CLOUD_LOGGING: &str = "enable_cloud_logging";
const ENABLE_CLOUD_MONITORING: &str = "enable_cloud_monitoring";
const ENABLE_CLOUD_TRACE: &str = "enable_cloud_trace";
const DESTINATION_PROJECT_ID: &str = "destination_project_id";
const FLUSH_MESSAGE_COUNT: &str = "flush_message_count";
const LOG_FILTERS: &str = "log_filters";
const EVENT_TYPES: &str = "event_types";
const GLOBAL_TRACE_SAMPLING_RATE: &str = "global_trace_sampling_rate";
const CUSTOM_TAGS: &str = "custom_tags";

const KNOWN_KEYS: [&str; 9] = [
    ENABLE_CLOUD_LOGGING,
    ENABLE_CLOUD_MONITORING,
    ENABLE_CLOUD_TRACE,
    DESTINATION_PROJECT_ID,
    FLUSH_MESSAGE_COUNT,
    LOG_FILTERS,
    EVENT_TYPES,
    GLOBAL_TRACE_SAMPLING_RATE,
    CUSTOM_TAGS,
];

static GLOBAL: OnceLock<ObservabilityConfig> = OnceLock::new();

/// Observability configuration for RPC call logging, monitoring and tracing.
///
/// Values are produced once by parsing and never change afterwards, so a
/// reference can be shared freely between threads.
///
/// # Example
///
/// ```
/// use callwatch_config::{ObservabilityConfig, SamplingStrategy};
///
/// let config = ObservabilityConfig::from_json_str(
///     r#"{"enable_cloud_logging": true, "global_trace_sampling_rate": 1.0}"#,
/// )
/// .unwrap();
///
/// assert!(config.cloud_logging_enabled());
/// assert!(!config.cloud_tracing_enabled());
/// assert_eq!(config.sampling(), SamplingStrategy::Always);
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ObservabilityConfig {
    enable_cloud_logging: bool,
    enable_cloud_monitoring: bool,
    enable_cloud_trace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flush_message_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_filters: Option<Vec<LogFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_types: Option<Vec<EventType>>,
    sampling: SamplingStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_tags: Option<BTreeMap<String, String>>,
}

impl ObservabilityConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// A document consisting of `null` yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MalformedJson` if the text is not valid JSON,
    /// or a schema violation if any field fails validation.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let tree: Value = serde_json::from_str(text)?;
        Self::from_value(&tree)
    }

    /// Validate an already parsed JSON tree.
    ///
    /// # Errors
    ///
    /// Returns a schema violation if the tree is neither `null` nor an
    /// object, or if any field fails validation.
    pub fn from_value(tree: &Value) -> Result<Self, ConfigError> {
        match tree {
            Value::Null => Ok(Self::default()),
            Value::Object(obj) => Self::from_object(obj),
            other => Err(ConfigError::type_mismatch(
                "<root>",
                "object",
                extract::type_name(other),
            )),
        }
    }

    /// Read and validate a JSON configuration file.
    ///
    /// The file handle is released before parsing begins.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read as UTF-8
    /// text, otherwise the errors of [`ObservabilityConfig::from_json_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::from_json_str(&content)
    }

    fn from_object(obj: &Object) -> Result<Self, ConfigError> {
        for key in obj.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "ignoring unknown observability configuration key");
            }
        }

        let mut config = Self::default();

        if let Some(value) = extract::get_bool(obj, "", ENABLE_CLOUD_LOGGING)? {
            config.enable_cloud_logging = value;
        }
        if let Some(value) = extract::get_bool(obj, "", ENABLE_CLOUD_MONITORING)? {
            config.enable_cloud_monitoring = value;
        }
        if let Some(value) = extract::get_bool(obj, "", ENABLE_CLOUD_TRACE)? {
            config.enable_cloud_trace = value;
        }

        config.destination_project_id = extract::get_string(obj, "", DESTINATION_PROJECT_ID)?;
        config.flush_message_count = extract::get_u64(obj, "", FLUSH_MESSAGE_COUNT)?;

        if let Some(items) = extract::get_list(obj, "", LOG_FILTERS)? {
            config.log_filters = Some(parse_log_filters(items)?);
        }
        if let Some(items) = extract::get_list(obj, "", EVENT_TYPES)? {
            config.event_types = Some(parse_event_types(items)?);
        }

        config.sampling =
            SamplingStrategy::from_rate(extract::get_f64(obj, "", GLOBAL_TRACE_SAMPLING_RATE)?)?;

        if let Some(tags) = extract::get_object(obj, "", CUSTOM_TAGS)? {
            config.custom_tags = Some(parse_custom_tags(tags)?);
        }

        Ok(config)
    }

    /// Whether RPC calls are logged to the cloud logging sink.
    pub fn cloud_logging_enabled(&self) -> bool {
        self.enable_cloud_logging
    }

    /// Whether RPC metrics are exported to cloud monitoring.
    pub fn cloud_monitoring_enabled(&self) -> bool {
        self.enable_cloud_monitoring
    }

    /// Whether RPC calls are traced.
    pub fn cloud_tracing_enabled(&self) -> bool {
        self.enable_cloud_trace
    }

    /// Project that receives exported observability data.
    pub fn destination_project_id(&self) -> Option<&str> {
        self.destination_project_id.as_deref()
    }

    /// Number of buffered log messages that triggers a flush.
    pub fn flush_message_count(&self) -> Option<u64> {
        self.flush_message_count
    }

    /// Log filters, in source order.
    pub fn log_filters(&self) -> Option<&[LogFilter]> {
        self.log_filters.as_deref()
    }

    /// Call events eligible for logging, in source order.
    pub fn event_types(&self) -> Option<&[EventType]> {
        self.event_types.as_deref()
    }

    /// Trace sampling strategy. Always resolved, even when not configured.
    pub fn sampling(&self) -> SamplingStrategy {
        self.sampling
    }

    /// Custom tags attached to exported observability data.
    pub fn custom_tags(&self) -> Option<&BTreeMap<String, String>> {
        self.custom_tags.as_ref()
    }
}

impl FromStr for ObservabilityConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

fn parse_log_filters(items: &[Value]) -> Result<Vec<LogFilter>, ConfigError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let path = format!("{LOG_FILTERS}[{index}]");
            let Value::Object(obj) = item else {
                return Err(ConfigError::type_mismatch(
                    path,
                    "object",
                    extract::type_name(item),
                ));
            };
            Ok(LogFilter::new(
                extract::get_string(obj, &path, "pattern")?,
                extract::get_u32(obj, &path, "header_bytes")?,
                extract::get_u32(obj, &path, "message_bytes")?,
            ))
        })
        .collect()
}

fn parse_event_types(items: &[Value]) -> Result<Vec<EventType>, ConfigError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let path = format!("{EVENT_TYPES}[{index}]");
            match item {
                Value::String(name) => name
                    .parse::<EventType>()
                    .map_err(|_| ConfigError::unknown_enum_value(path, name.as_str())),
                other => Err(ConfigError::type_mismatch(
                    path,
                    "string",
                    extract::type_name(other),
                )),
            }
        })
        .collect()
}

fn parse_custom_tags(tags: &Object) -> Result<BTreeMap<String, String>, ConfigError> {
    tags.iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key.clone(), s.clone())),
            other => Err(ConfigError::non_string_tag(
                key.as_str(),
                extract::type_name(other),
            )),
        })
        .collect()
}

/// Install `config` as the process-wide observability configuration.
///
/// There is no update path: the first installed value is kept for the
/// lifetime of the process.
///
/// # Errors
///
/// Returns `ConfigError::AlreadyInstalled` if a configuration was installed
/// earlier.
pub fn install_global(
    config: ObservabilityConfig,
) -> Result<&'static ObservabilityConfig, ConfigError> {
    let mut installed = false;
    let stored = GLOBAL.get_or_init(|| {
        installed = true;
        config
    });
    if installed {
        Ok(stored)
    } else {
        Err(ConfigError::AlreadyInstalled)
    }
}

/// The process-wide observability configuration, if one was installed.
pub fn global() -> Option<&'static ObservabilityConfig> {
    GLOBAL.get()
}
