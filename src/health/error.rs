//! Failure taxonomy and normalization of arbitrary failures into one shape.
//!
//! Every probe is a failure boundary: whatever goes wrong inside it (a typed
//! error from a client library, a bare message, a panic payload, an arbitrary
//! value) ends up as an [`ErrorDetail`] embedded in the probe's report.

use std::any::Any;
use std::error::Error as StdError;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Error type returned by collaborators.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Detail attached to string and object failures.
pub const NON_ERROR_THROWN: &str = "Non-Error object thrown";

/// Placeholder used when a failure value cannot be serialized.
pub const UNSERIALIZABLE_OBJECT: &str = "[Unserializable object]";

/// Failures raised by the health subsystem itself.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Connectivity(String),

    #[error("{0} is not configured")]
    ConfigurationMissing(String),

    #[error("{metric} is {value}, threshold is {threshold}")]
    ThresholdExceeded {
        metric: String,
        value: f64,
        threshold: f64,
    },

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Unknown(String),
}

impl ProbeError {
    /// Taxonomy name reported as `ErrorDetail::name`.
    pub fn category(&self) -> &'static str {
        match self {
            ProbeError::Connectivity(_) => "ConnectivityFailure",
            ProbeError::ConfigurationMissing(_) => "ConfigurationMissing",
            ProbeError::ThresholdExceeded { .. } => "ThresholdExceeded",
            ProbeError::Timeout(_) => "Timeout",
            ProbeError::Unknown(_) => "UnknownThrown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Typed,
    String,
    Object,
}

/// Normalized failure record embedded into `HealthReport.details.error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A remote service's error body that is not a typed error, such as the
/// JSON `error` object of an HTTP API. Collaborators return it boxed; the
/// normalizer reports a JSON string body as a string failure and anything
/// else as an object failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("remote error payload: {0}")]
pub struct ErrorPayload(pub serde_json::Value);

/// A failure value as observed at a probe boundary.
#[derive(Debug, Clone, Copy)]
pub enum Thrown<'a> {
    Error(&'a (dyn StdError + 'static)),
    Message(&'a str),
    Panic(&'a (dyn Any + Send)),
}

/// Converts failures into [`ErrorDetail`]s.
///
/// The error's `source()` chain is reported as `stack`, and only when
/// `include_stack` is set (never in production).
#[derive(Debug, Clone, Copy)]
pub struct ErrorNormalizer {
    include_stack: bool,
}

impl ErrorNormalizer {
    pub fn new(include_stack: bool) -> Self {
        Self { include_stack }
    }

    pub fn normalize(&self, thrown: Thrown<'_>) -> ErrorDetail {
        match thrown {
            Thrown::Error(err) => match err.downcast_ref::<ErrorPayload>() {
                Some(ErrorPayload(serde_json::Value::String(message))) => {
                    self.normalize(Thrown::Message(message))
                }
                Some(ErrorPayload(value)) => self.object(value),
                None => self.typed(err),
            },
            Thrown::Message(message) => string_detail(message),
            Thrown::Panic(payload) => {
                if let Some(message) = payload.downcast_ref::<&str>() {
                    string_detail(message)
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    string_detail(message)
                } else {
                    ErrorDetail {
                        kind: ErrorKind::Object,
                        message: UNSERIALIZABLE_OBJECT.to_string(),
                        name: None,
                        stack: None,
                        details: Some(NON_ERROR_THROWN.to_string()),
                    }
                }
            }
        }
    }

    /// Shorthand for `normalize(Thrown::Error(err))`.
    pub fn error(&self, err: &(dyn StdError + 'static)) -> ErrorDetail {
        self.normalize(Thrown::Error(err))
    }

    /// Normalize an arbitrary value. Values whose serialization fails fall
    /// back to a fixed placeholder instead of raising a second failure.
    pub fn object<T: Serialize + ?Sized>(&self, value: &T) -> ErrorDetail {
        let message =
            serde_json::to_string(value).unwrap_or_else(|_| UNSERIALIZABLE_OBJECT.to_string());
        ErrorDetail {
            kind: ErrorKind::Object,
            message,
            name: None,
            stack: None,
            details: Some(NON_ERROR_THROWN.to_string()),
        }
    }

    fn typed(&self, err: &(dyn StdError + 'static)) -> ErrorDetail {
        ErrorDetail {
            kind: ErrorKind::Typed,
            message: err.to_string(),
            name: Some(error_name(err).to_string()),
            stack: self.include_stack.then(|| source_chain(err)),
            details: None,
        }
    }
}

impl Default for ErrorNormalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

fn string_detail(message: &str) -> ErrorDetail {
    ErrorDetail {
        kind: ErrorKind::String,
        message: message.to_string(),
        name: None,
        stack: None,
        details: Some(NON_ERROR_THROWN.to_string()),
    }
}

fn error_name(err: &(dyn StdError + 'static)) -> &'static str {
    if let Some(probe) = err.downcast_ref::<ProbeError>() {
        probe.category()
    } else if err.is::<std::io::Error>() {
        "IoError"
    } else if err.is::<reqwest::Error>() {
        "HttpError"
    } else if err.is::<serde_json::Error>() {
        "JsonError"
    } else if err.is::<tokio::time::error::Elapsed>() {
        "Timeout"
    } else {
        "Error"
    }
}

fn source_chain(err: &(dyn StdError + 'static)) -> String {
    let mut chain = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push_str("\n    caused by: ");
        chain.push_str(&cause.to_string());
        current = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};

    struct SelfReferential;

    impl Serialize for SelfReferential {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cycle detected"))
        }
    }

    #[derive(Debug, Error)]
    #[error("query failed")]
    struct QueryError {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn test_string_thrown() {
        let detail = ErrorNormalizer::default().normalize(Thrown::Message("String error"));
        assert_eq!(detail.kind, ErrorKind::String);
        assert_eq!(detail.message, "String error");
        assert_eq!(detail.details.as_deref(), Some(NON_ERROR_THROWN));
    }

    #[test]
    fn test_typed_error_carries_name_and_chain() {
        let err = QueryError {
            source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
        };
        let detail = ErrorNormalizer::new(true).error(&err);

        assert_eq!(detail.kind, ErrorKind::Typed);
        assert_eq!(detail.message, "query failed");
        assert_eq!(detail.name.as_deref(), Some("Error"));
        assert!(detail.stack.unwrap().contains("caused by: connection reset"));
    }

    #[test]
    fn test_stack_omitted_in_production() {
        let err = ProbeError::Connectivity("database not connected".into());
        let detail = ErrorNormalizer::new(false).error(&err);

        assert_eq!(detail.name.as_deref(), Some("ConnectivityFailure"));
        assert!(detail.stack.is_none());
    }

    #[test]
    fn test_unserializable_object_falls_back() {
        let detail = ErrorNormalizer::default().object(&SelfReferential);
        assert_eq!(detail.kind, ErrorKind::Object);
        assert_eq!(detail.message, UNSERIALIZABLE_OBJECT);
    }

    #[test]
    fn test_plain_object_is_stringified() {
        let detail = ErrorNormalizer::default().object(&serde_json::json!({ "code": 42 }));
        assert_eq!(detail.message, r#"{"code":42}"#);
        assert_eq!(detail.details.as_deref(), Some(NON_ERROR_THROWN));
    }

    #[test]
    fn test_remote_payloads_are_not_typed() {
        let normalizer = ErrorNormalizer::default();

        let err: BoxError = Box::new(ErrorPayload(serde_json::json!({ "type": "card_error" })));
        let detail = normalizer.error(&*err);
        assert_eq!(detail.kind, ErrorKind::Object);
        assert_eq!(detail.message, r#"{"type":"card_error"}"#);
        assert!(detail.name.is_none());

        let err: BoxError = Box::new(ErrorPayload("rate limited".into()));
        let detail = normalizer.error(&*err);
        assert_eq!(detail.kind, ErrorKind::String);
        assert_eq!(detail.message, "rate limited");
    }

    #[test]
    fn test_panic_payloads() {
        let normalizer = ErrorNormalizer::default();

        let payload: Box<dyn Any + Send> = Box::new("probe exploded");
        let detail = normalizer.normalize(Thrown::Panic(&*payload));
        assert_eq!(detail.kind, ErrorKind::String);
        assert_eq!(detail.message, "probe exploded");

        let payload: Box<dyn Any + Send> = Box::new(17u32);
        let detail = normalizer.normalize(Thrown::Panic(&*payload));
        assert_eq!(detail.kind, ErrorKind::Object);
        assert_eq!(detail.message, UNSERIALIZABLE_OBJECT);
    }

    #[test]
    fn test_probe_error_messages() {
        assert_eq!(
            ProbeError::Timeout(Duration::from_secs(30)).to_string(),
            "timed out after 30000ms"
        );
        assert_eq!(
            ProbeError::ConfigurationMissing("billing API secret".into()).to_string(),
            "billing API secret is not configured"
        );
    }
}
