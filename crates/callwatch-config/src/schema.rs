//! Configuration schema types.
//!
//! This module defines the value types held by an
//! [`ObservabilityConfig`](crate::ObservabilityConfig): call lifecycle event
//! types, log filters and the derived sampling strategy.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ConfigError;

/// Tolerance used when deciding whether a sampling rate is effectively 1.0.
///
/// Probability samplers compare a random draw against the rate, so a nominal
/// rate of exactly 1.0 can still occasionally decline a trace at the
/// boundary. Rates within this distance of 1.0 resolve to
/// [`SamplingStrategy::Always`] instead.
pub const SAMPLING_EPSILON: f64 = 1e-6;

/// A stage of an RPC call lifecycle that is eligible for logging.
///
/// The set is closed: parsing a name outside it is an error, never a
/// fallback to [`EventType::Unknown`].
///
/// # Example
///
/// ```
/// use callwatch_config::EventType;
///
/// let event: EventType = "GRPC_CALL_TRAILER".parse().unwrap();
/// assert_eq!(event, EventType::Trailer);
/// assert!("GRPC_CALL_BOGUS".parse::<EventType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Unclassified event.
    #[serde(rename = "GRPC_CALL_UNKNOWN")]
    Unknown,
    /// Request headers sent by the client.
    #[serde(rename = "GRPC_CALL_REQUEST_HEADER")]
    RequestHeader,
    /// Response headers sent by the server.
    #[serde(rename = "GRPC_CALL_RESPONSE_HEADER")]
    ResponseHeader,
    /// A request message.
    #[serde(rename = "GRPC_CALL_REQUEST_MESSAGE")]
    RequestMessage,
    /// A response message.
    #[serde(rename = "GRPC_CALL_RESPONSE_MESSAGE")]
    ResponseMessage,
    /// Trailing metadata and status.
    #[serde(rename = "GRPC_CALL_TRAILER")]
    Trailer,
    /// The client finished sending.
    #[serde(rename = "GRPC_CALL_HALF_CLOSE")]
    HalfClose,
    /// The call was cancelled.
    #[serde(rename = "GRPC_CALL_CANCEL")]
    Cancel,
}

impl EventType {
    /// Every event type, in wire declaration order.
    pub const ALL: [EventType; 8] = [
        EventType::Unknown,
        EventType::RequestHeader,
        EventType::ResponseHeader,
        EventType::RequestMessage,
        EventType::ResponseMessage,
        EventType::Trailer,
        EventType::HalfClose,
        EventType::Cancel,
    ];

    /// Returns the canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "GRPC_CALL_UNKNOWN",
            Self::RequestHeader => "GRPC_CALL_REQUEST_HEADER",
            Self::ResponseHeader => "GRPC_CALL_RESPONSE_HEADER",
            Self::RequestMessage => "GRPC_CALL_REQUEST_MESSAGE",
            Self::ResponseMessage => "GRPC_CALL_RESPONSE_MESSAGE",
            Self::Trailer => "GRPC_CALL_TRAILER",
            Self::HalfClose => "GRPC_CALL_HALF_CLOSE",
            Self::Cancel => "GRPC_CALL_CANCEL",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| ConfigError::unknown_enum_value("event_types", s))
    }
}

/// A rule selecting which calls to log, with optional size caps.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct LogFilter {
    pattern: Option<String>,
    header_bytes: Option<u32>,
    message_bytes: Option<u32>,
}

impl LogFilter {
    /// Create a new log filter.
    pub fn new(
        pattern: Option<String>,
        header_bytes: Option<u32>,
        message_bytes: Option<u32>,
    ) -> Self {
        Self {
            pattern,
            header_bytes,
            message_bytes,
        }
    }

    /// Method pattern this filter applies to.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Maximum number of header bytes to log.
    pub fn header_bytes(&self) -> Option<u32> {
        self.header_bytes
    }

    /// Maximum number of message bytes to log.
    pub fn message_bytes(&self) -> Option<u32> {
        self.message_bytes
    }
}

/// Policy governing what fraction of traced calls are recorded.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
#[serde(tag = "strategy", content = "rate", rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Record no traces.
    #[default]
    Never,
    /// Record every trace.
    Always,
    /// Record traces with the given probability, strictly between 0 and 1.
    Probabilistic(f64),
}

impl SamplingStrategy {
    /// Derive a strategy from an optional sampling rate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfRange` if the rate is NaN or outside
    /// `[0.0, 1.0]`.
    ///
    /// # Example
    ///
    /// ```
    /// use callwatch_config::SamplingStrategy;
    ///
    /// assert_eq!(SamplingStrategy::from_rate(None).unwrap(), SamplingStrategy::Never);
    /// assert_eq!(SamplingStrategy::from_rate(Some(1.0)).unwrap(), SamplingStrategy::Always);
    /// assert_eq!(
    ///     SamplingStrategy::from_rate(Some(0.25)).unwrap(),
    ///     SamplingStrategy::Probabilistic(0.25)
    /// );
    /// assert!(SamplingStrategy::from_rate(Some(1.5)).is_err());
    /// ```
    pub fn from_rate(rate: Option<f64>) -> Result<Self, ConfigError> {
        let Some(rate) = rate else {
            return Ok(Self::Never);
        };

        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::out_of_range(
                "global_trace_sampling_rate",
                rate,
                "needs to be between [0.0, 1.0]",
            ));
        }

        if 1.0 - rate < SAMPLING_EPSILON {
            Ok(Self::Always)
        } else if rate == 0.0 {
            Ok(Self::Never)
        } else {
            Ok(Self::Probabilistic(rate))
        }
    }

    /// Effective fraction of traces recorded under this strategy.
    pub fn probability(&self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::Always => 1.0,
            Self::Probabilistic(rate) => *rate,
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Always => f.write_str("always"),
            Self::Probabilistic(rate) => write!(f, "probabilistic({rate})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names_round_trip() {
        for event in EventType::ALL {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
        }
    }

    #[test]
    fn test_event_type_is_case_sensitive() {
        assert!("grpc_call_trailer".parse::<EventType>().is_err());
        assert!("TRAILER".parse::<EventType>().is_err());
        assert!("".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_serializes_to_wire_name() {
        let json = serde_json::to_string(&EventType::HalfClose).unwrap();
        assert_eq!(json, "\"GRPC_CALL_HALF_CLOSE\"");
        assert_eq!(EventType::Cancel.to_string(), "GRPC_CALL_CANCEL");
    }

    #[test]
    fn test_log_filter_accessors() {
        let filter = LogFilter::new(Some("*".to_string()), Some(10), None);
        assert_eq!(filter.pattern(), Some("*"));
        assert_eq!(filter.header_bytes(), Some(10));
        assert_eq!(filter.message_bytes(), None);
    }

    #[test]
    fn test_sampling_absent_is_never() {
        assert_eq!(
            SamplingStrategy::from_rate(None).unwrap(),
            SamplingStrategy::Never
        );
    }

    #[test]
    fn test_sampling_zero_is_never() {
        assert_eq!(
            SamplingStrategy::from_rate(Some(0.0)).unwrap(),
            SamplingStrategy::Never
        );
    }

    #[test]
    fn test_sampling_near_one_is_always() {
        assert_eq!(
            SamplingStrategy::from_rate(Some(1.0)).unwrap(),
            SamplingStrategy::Always
        );
        assert_eq!(
            SamplingStrategy::from_rate(Some(0.999_999_5)).unwrap(),
            SamplingStrategy::Always
        );
        assert_eq!(
            SamplingStrategy::from_rate(Some(0.999_99)).unwrap(),
            SamplingStrategy::Probabilistic(0.999_99)
        );
    }

    #[test]
    fn test_sampling_out_of_range() {
        for rate in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let err = SamplingStrategy::from_rate(Some(rate)).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { .. }), "{rate}");
        }
    }

    #[test]
    fn test_sampling_probability() {
        assert_eq!(SamplingStrategy::Never.probability(), 0.0);
        assert_eq!(SamplingStrategy::Always.probability(), 1.0);
        assert_eq!(SamplingStrategy::Probabilistic(0.3).probability(), 0.3);
    }

    #[test]
    fn test_sampling_serialization() {
        let json = serde_json::to_value(SamplingStrategy::Probabilistic(0.5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"strategy": "probabilistic", "rate": 0.5})
        );
        let json = serde_json::to_value(SamplingStrategy::Never).unwrap();
        assert_eq!(json, serde_json::json!({"strategy": "never"}));
    }
}
