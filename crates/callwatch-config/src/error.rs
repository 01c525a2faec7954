//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, parsing or validating the
/// observability configuration.
///
/// Every error is terminal for the load call: no partially populated
/// configuration is ever returned alongside one.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No configuration text could be found.
    #[error("observability configuration unavailable: {reason}")]
    SourceUnavailable {
        /// What was missing.
        reason: String,
    },

    /// Failed to read the configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An environment variable is set but its value is not valid UTF-8.
    #[error("environment variable {var} is not valid UTF-8")]
    InvalidEncoding {
        /// Name of the variable.
        var: String,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {path}")]
    Dotenv {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: dotenvy::Error,
    },

    /// The configuration text is not valid JSON.
    #[error("failed to parse JSON configuration: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// A field is present but holds a value of the wrong JSON type.
    #[error("type mismatch for {field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Dotted path of the offending field.
        field: String,
        /// The JSON type the field requires.
        expected: &'static str,
        /// The JSON type actually found.
        found: &'static str,
    },

    /// A numeric field is outside its permitted range.
    #[error("value out of range for {field}: {value} ({reason})")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: String,
        /// The offending value, as written in the source.
        value: String,
        /// The permitted range.
        reason: String,
    },

    /// A string does not name a member of a closed enumeration.
    #[error("unknown value for {field}: {value:?}")]
    UnknownEnumValue {
        /// Dotted path of the offending field.
        field: String,
        /// The unrecognized token.
        value: String,
    },

    /// `custom_tags` holds a value that is not a string.
    #[error("custom_tags needs to be a map of <string, string>: key {key:?} holds {found}")]
    NonStringTag {
        /// The tag whose value is not a string.
        key: String,
        /// The JSON type actually found.
        found: &'static str,
    },

    /// A process-wide configuration has already been installed.
    #[error("observability configuration is already installed")]
    AlreadyInstalled,
}

/// Broad classification of a [`ConfigError`].
///
/// Callers that only need to decide how to report a failure can match on the
/// kind instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// Neither configuration source was provided.
    SourceUnavailable,
    /// The configuration file could not be read.
    Io,
    /// The configuration text is not well-formed JSON.
    MalformedInput,
    /// The JSON is well-formed but violates the configuration schema.
    SchemaViolation,
    /// The operation conflicts with already installed process state.
    State,
}

impl ConfigError {
    /// Create a new source unavailable error.
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid encoding error.
    pub fn invalid_encoding(var: impl Into<String>) -> Self {
        Self::InvalidEncoding { var: var.into() }
    }

    /// Create a new `.env` load error.
    pub fn dotenv(path: impl Into<PathBuf>, source: dotenvy::Error) -> Self {
        Self::Dotenv {
            path: path.into(),
            source,
        }
    }

    /// Create a new type mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }

    /// Create a new out of range error.
    pub fn out_of_range(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new unknown enumeration value error.
    pub fn unknown_enum_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new non-string tag error.
    pub fn non_string_tag(key: impl Into<String>, found: &'static str) -> Self {
        Self::NonStringTag {
            key: key.into(),
            found,
        }
    }

    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            Self::SourceUnavailable { .. } => ConfigErrorKind::SourceUnavailable,
            Self::ReadError { .. } | Self::InvalidEncoding { .. } => ConfigErrorKind::Io,
            Self::Dotenv {
                source: dotenvy::Error::LineParse(..),
                ..
            }
            | Self::MalformedJson(_) => ConfigErrorKind::MalformedInput,
            Self::Dotenv { .. } => ConfigErrorKind::Io,
            Self::TypeMismatch { .. }
            | Self::OutOfRange { .. }
            | Self::UnknownEnumValue { .. }
            | Self::NonStringTag { .. } => ConfigErrorKind::SchemaViolation,
            Self::AlreadyInstalled => ConfigErrorKind::State,
        }
    }

    /// Returns the offending field path for schema violations.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::UnknownEnumValue { field, .. } => Some(field),
            Self::NonStringTag { .. } => Some("custom_tags"),
            _ => None,
        }
    }
}
