//! Domain error types
//!
//! This module defines the error hierarchy for the SDK. Errors returned by the
//! Ambra services are decoded into [`ServiceError`], which keeps the raw
//! `error_type`/`error_subtype` pair together with the HTTP status class.
//! No third-party HTTP or WebSocket types leak through these errors.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main SDK error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum AmbraError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid arguments or unsupported query features
    #[error("Validation error: {0}")]
    Validation(String),

    /// Login failed or no usable session
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request may have reached the server but no reply arrived
    #[error("Request interrupted: {0}")]
    Interrupted(String),

    /// Error response returned by the Ambra service
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// WebSocket channel errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Code generator errors
    #[error("Code generation error: {0}")]
    Codegen(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl AmbraError {
    /// Returns the service error if this is one
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            AmbraError::Service(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failed operation may succeed if repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            AmbraError::Connection(_) => true,
            AmbraError::Service(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Error class derived from the HTTP status of a service response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// 400
    BadRequest,
    /// 401, the session is missing or expired
    AuthorizationRequired,
    /// 403
    PermissionDenied,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 412, the generic "call failed" status used by most endpoints
    PreconditionFailed,
    /// 429
    TooManyRequests,
    /// 5xx
    ServerError,
    /// Anything else, including an `ERROR` body with a 2xx status
    Unexpected,
}

impl ServiceErrorKind {
    /// Map an HTTP status code to an error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ServiceErrorKind::BadRequest,
            401 => ServiceErrorKind::AuthorizationRequired,
            403 => ServiceErrorKind::PermissionDenied,
            404 => ServiceErrorKind::NotFound,
            409 => ServiceErrorKind::Conflict,
            412 => ServiceErrorKind::PreconditionFailed,
            429 => ServiceErrorKind::TooManyRequests,
            500..=599 => ServiceErrorKind::ServerError,
            _ => ServiceErrorKind::Unexpected,
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceErrorKind::BadRequest => "bad request",
            ServiceErrorKind::AuthorizationRequired => "authorization required",
            ServiceErrorKind::PermissionDenied => "permission denied",
            ServiceErrorKind::NotFound => "not found",
            ServiceErrorKind::Conflict => "conflict",
            ServiceErrorKind::PreconditionFailed => "precondition failed",
            ServiceErrorKind::TooManyRequests => "too many requests",
            ServiceErrorKind::ServerError => "server error",
            ServiceErrorKind::Unexpected => "unexpected response",
        };
        f.write_str(s)
    }
}

/// One entry of an endpoint's documented error table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSpec {
    /// The `error_type` value, e.g. `NOT_FOUND`
    pub error_type: &'static str,
    /// Optional `error_subtype`; `None` matches any subtype
    pub error_subtype: Option<&'static str>,
    /// Human readable meaning for this endpoint
    pub description: &'static str,
}

impl ErrorSpec {
    /// Error entry matching any subtype
    pub const fn new(error_type: &'static str, description: &'static str) -> Self {
        Self {
            error_type,
            error_subtype: None,
            description,
        }
    }

    /// Error entry for a specific subtype
    pub const fn with_subtype(
        error_type: &'static str,
        error_subtype: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            error_type,
            error_subtype: Some(error_subtype),
            description,
        }
    }

    fn matches(&self, error_type: &str, error_subtype: Option<&str>) -> bool {
        if self.error_type != error_type {
            return false;
        }
        match self.error_subtype {
            None => true,
            Some(expected) => error_subtype == Some(expected),
        }
    }
}

/// Decoded error response from the Ambra services
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    /// HTTP status code
    pub status: u16,
    /// Error class derived from `status`
    pub kind: ServiceErrorKind,
    /// `error_type` from the body, if any
    pub error_type: Option<String>,
    /// `error_subtype` from the body, if any
    pub error_subtype: Option<String>,
    /// `error_data` from the body, if any
    pub error_data: Option<Value>,
    /// Endpoint path that failed
    pub url: String,
    /// Endpoint-specific description of `error_type`
    pub description: Option<String>,
}

impl ServiceError {
    /// Build an error from an HTTP status and an optional JSON body
    ///
    /// The `{error_type, error_subtype}` pair is looked up in `table`. A
    /// subtype-specific entry wins over a type-only entry.
    pub fn from_response(
        url: impl Into<String>,
        status: u16,
        body: Option<&Value>,
        table: &[ErrorSpec],
    ) -> Self {
        let field = |name: &str| {
            body.and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let error_type = field("error_type");
        let error_subtype = field("error_subtype");
        let error_data = body
            .and_then(|b| b.get("error_data"))
            .filter(|v| !v.is_null())
            .cloned();

        let description = error_type.as_deref().and_then(|et| {
            let subtype = error_subtype.as_deref();
            table
                .iter()
                .filter(|spec| spec.matches(et, subtype))
                .max_by_key(|spec| spec.error_subtype.is_some())
                .map(|spec| spec.description.to_string())
        });

        Self {
            status,
            kind: ServiceErrorKind::from_status(status),
            error_type,
            error_subtype,
            error_data,
            url: url.into(),
            description,
        }
    }

    /// Whether the error type equals `error_type`
    pub fn is(&self, error_type: &str) -> bool {
        self.error_type.as_deref() == Some(error_type)
    }

    /// Whether the endpoint documents this error
    pub fn is_documented(&self) -> bool {
        self.description.is_some()
    }

    /// Server-side failures and throttling are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ServiceErrorKind::ServerError | ServiceErrorKind::TooManyRequests
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.url, self.kind, self.status)?;
        if let Some(ref et) = self.error_type {
            write!(f, ": {et}")?;
            if let Some(ref sub) = self.error_subtype {
                write!(f, "/{sub}")?;
            }
        }
        if let Some(ref desc) = self.description {
            write!(f, " - {desc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for AmbraError {
    fn from(err: std::io::Error) -> Self {
        AmbraError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AmbraError {
    fn from(err: serde_json::Error) -> Self {
        AmbraError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AmbraError {
    fn from(err: toml::de::Error) -> Self {
        AmbraError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<reqwest::Error> for AmbraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AmbraError::Serialization(err.to_string())
        } else {
            AmbraError::Connection(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AmbraError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AmbraError::WebSocket(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TABLE: &[ErrorSpec] = &[
        ErrorSpec::new("NOT_FOUND", "The study can not be found"),
        ErrorSpec::with_subtype("NOT_FOUND", "ACCOUNT", "The account can not be found"),
        ErrorSpec::new("NOT_PERMITTED", "You are not permitted to view this study"),
    ];

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ServiceErrorKind::from_status(401), ServiceErrorKind::AuthorizationRequired);
        assert_eq!(ServiceErrorKind::from_status(412), ServiceErrorKind::PreconditionFailed);
        assert_eq!(ServiceErrorKind::from_status(503), ServiceErrorKind::ServerError);
        assert_eq!(ServiceErrorKind::from_status(418), ServiceErrorKind::Unexpected);
    }

    #[test]
    fn test_from_response_type_only() {
        let body = json!({"status": "ERROR", "error_type": "NOT_FOUND", "error_subtype": null});
        let err = ServiceError::from_response("/study/get", 412, Some(&body), TABLE);

        assert!(err.is("NOT_FOUND"));
        assert_eq!(err.kind, ServiceErrorKind::PreconditionFailed);
        assert_eq!(err.description.as_deref(), Some("The study can not be found"));
        assert!(err.error_data.is_none());
    }

    #[test]
    fn test_from_response_subtype_wins() {
        let body = json!({"error_type": "NOT_FOUND", "error_subtype": "ACCOUNT"});
        let err = ServiceError::from_response("/study/get", 412, Some(&body), TABLE);
        assert_eq!(err.description.as_deref(), Some("The account can not be found"));
    }

    #[test]
    fn test_from_response_unknown_pair_preserved() {
        let body = json!({"error_type": "LOCKED", "error_subtype": "STUDY", "error_data": {"by": "x"}});
        let err = ServiceError::from_response("/study/set", 412, Some(&body), TABLE);

        assert!(!err.is_documented());
        assert_eq!(err.error_type.as_deref(), Some("LOCKED"));
        assert_eq!(err.error_subtype.as_deref(), Some("STUDY"));
        assert_eq!(err.error_data, Some(json!({"by": "x"})));
    }

    #[test]
    fn test_from_response_without_body() {
        let err = ServiceError::from_response("/study/list", 502, None, TABLE);
        assert!(err.error_type.is_none());
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "/study/list server error (502)");
    }

    #[test]
    fn test_display_includes_type_and_description() {
        let body = json!({"error_type": "NOT_PERMITTED"});
        let err = ServiceError::from_response("/study/get", 403, Some(&body), TABLE);
        assert_eq!(
            err.to_string(),
            "/study/get permission denied (403): NOT_PERMITTED - You are not permitted to view this study"
        );
    }

    #[test]
    fn test_ambra_error_retryable() {
        assert!(AmbraError::Connection("reset".to_string()).is_retryable());
        assert!(!AmbraError::Validation("bad".to_string()).is_retryable());
        assert!(!AmbraError::Interrupted("timed out".to_string()).is_retryable());

        let body = json!({"error_type": "NOT_FOUND"});
        let err: AmbraError = ServiceError::from_response("/x", 412, Some(&body), &[]).into();
        assert!(!err.is_retryable());
        assert!(err.as_service().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: AmbraError = io_err.into();
        assert!(matches!(err, AmbraError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: AmbraError = toml_err.into();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
