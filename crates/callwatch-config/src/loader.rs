//! Configuration source resolution.
//!
//! This module provides the [`ConfigLoader`], which decides which text to
//! parse from two environment variables:
//!
//! 1. `GRPC_CONFIG_OBSERVABILITY_JSON` names a file holding the JSON document
//! 2. `GRPC_CONFIG_OBSERVABILITY` holds the JSON document itself
//!
//! The file form takes priority when both are set.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ObservabilityConfig};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_FILE_ENV_VAR: &str = "GRPC_CONFIG_OBSERVABILITY_JSON";

/// Environment variable holding inline JSON configuration.
pub const CONFIG_ENV_VAR: &str = "GRPC_CONFIG_OBSERVABILITY";

/// Environment variable reader.
///
/// [`Env::process`] reads the real process environment. [`Env::from_pairs`]
/// reads a fixed set of values, so callers and tests never need to mutate
/// the process environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    overrides: Option<HashMap<String, OsString>>,
}

impl Env {
    /// Create an `Env` that reads from the process environment.
    pub fn process() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn from_pairs<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<OsString>,
    {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a variable without decoding it. Unset and empty values are
    /// `None`.
    pub fn var_os(&self, name: &str) -> Option<OsString> {
        let value = match &self.overrides {
            Some(map) => map.get(name).cloned(),
            None => env::var_os(name),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Look up a variable as UTF-8 text. Unset and empty values are `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEncoding` if the variable is set but is
    /// not valid UTF-8.
    pub fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        self.var_os(name)
            .map(|v| v.into_string().map_err(|_| ConfigError::invalid_encoding(name)))
            .transpose()
    }
}

/// Where the configuration text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file named by [`CONFIG_FILE_ENV_VAR`].
    File(PathBuf),
    /// Inline text from [`CONFIG_ENV_VAR`].
    Inline(String),
}

impl ConfigSource {
    /// Short description for log messages. Never includes inline content.
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => format!("file {}", path.display()),
            Self::Inline(text) => format!("{CONFIG_ENV_VAR} ({} bytes)", text.len()),
        }
    }

    /// Read the source text and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if a file source cannot be read,
    /// otherwise any parse or validation error.
    pub fn load(&self) -> Result<ObservabilityConfig, ConfigError> {
        match self {
            Self::File(path) => ObservabilityConfig::from_file(path),
            Self::Inline(text) => ObservabilityConfig::from_json_str(text),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Loads the observability configuration from the environment.
///
/// # Example
///
/// ```
/// use callwatch_config::{ConfigLoader, Env};
///
/// let env = Env::from_pairs([("GRPC_CONFIG_OBSERVABILITY", r#"{"enable_cloud_trace": true}"#)]);
/// let config = ConfigLoader::with_env(env).load().unwrap();
///
/// assert!(config.cloud_tracing_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    env: Env,
}

impl ConfigLoader {
    /// Create a loader reading the process environment.
    pub fn new() -> Self {
        Self {
            env: Env::process(),
        }
    }

    /// Create a loader reading the given environment.
    pub fn with_env(env: Env) -> Self {
        Self { env }
    }

    /// Load a `.env` file from the working directory (or a parent) into the
    /// process environment, if one exists.
    ///
    /// Only affects loaders that read the process environment. Variables
    /// already set in the process are not overridden.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but cannot be
    /// read or parsed. Lines before the failing one may already be applied.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::dotenv(".env", e)),
        }
        Ok(self)
    }

    /// Load the given `.env` file into the process environment, if it
    /// exists.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::with_dotenv`].
    pub fn with_dotenv_from(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match dotenvy::from_path(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::dotenv(path, e)),
        }
        Ok(self)
    }

    /// Decide which source to read.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceUnavailable` if neither variable is set,
    /// and `ConfigError::InvalidEncoding` if the inline variable is consulted
    /// and is not valid UTF-8. The file variable is used as a raw path.
    pub fn resolve_source(&self) -> Result<ConfigSource, ConfigError> {
        if let Some(path) = self.env.var_os(CONFIG_FILE_ENV_VAR) {
            return Ok(ConfigSource::File(PathBuf::from(path)));
        }
        if let Some(text) = self.env.var(CONFIG_ENV_VAR)? {
            return Ok(ConfigSource::Inline(text));
        }
        Err(ConfigError::source_unavailable(format!(
            "neither {CONFIG_FILE_ENV_VAR} nor {CONFIG_ENV_VAR} is set"
        )))
    }

    /// Resolve the source, then read and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceUnavailable` if neither variable is set,
    /// `ConfigError::ReadError` if the named file cannot be read, and any
    /// parse or validation error otherwise.
    pub fn load(&self) -> Result<ObservabilityConfig, ConfigError> {
        let source = self.resolve_source().map_err(|e| {
            tracing::warn!(error = %e, "no observability configuration source");
            e
        })?;
        tracing::debug!(source = %source, "loading observability configuration");

        let config = source.load().map_err(|e| {
            tracing::warn!(source = %source, error = %e, "invalid observability configuration");
            e
        })?;

        tracing::info!(
            source = %source,
            cloud_logging = config.cloud_logging_enabled(),
            cloud_monitoring = config.cloud_monitoring_enabled(),
            cloud_trace = config.cloud_tracing_enabled(),
            sampling = %config.sampling(),
            "observability configuration loaded"
        );
        Ok(config)
    }

    /// Validate configuration text that has already been resolved.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceUnavailable` if `text` is `None`,
    /// otherwise any parse or validation error.
    pub fn load_text(text: Option<&str>) -> Result<ObservabilityConfig, ConfigError> {
        let text = text.ok_or_else(|| {
            ConfigError::source_unavailable(format!("{CONFIG_ENV_VAR} value is null"))
        })?;
        ObservabilityConfig::from_json_str(text)
    }
}
