//! Error types for vRealize Operations API operations.
//!
//! Every crate in the workspace reports failures through [`Error`]. Variants fall into
//! three groups: request configuration problems, missing authentication, and transport
//! failures raised while executing a request. Nothing in the request pipeline recovers
//! from an error locally; all of them propagate to the immediate caller.

use thiserror::Error;

/// Main error type for vROps operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A mandatory request component is missing or malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No credential was supplied where one is required
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for service: {0}")]
    Timeout(String),

    /// The API endpoint could not be reached or returned a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse an API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Writing the response to its output target failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A configuration field is out of range
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for vROps operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::AuthenticationError(_) => "AUTHENTICATION_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if the error was raised while executing a request.
    ///
    /// Transport errors come from the execution collaborator and are handed back to the
    /// caller exactly as they were produced.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_)
                | Self::Timeout(_)
                | Self::ServiceUnavailable(_)
                | Self::NotFound(_)
                | Self::InvalidRequest(_)
                | Self::ParseError(_)
                | Self::Io(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderName> for Error {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        Self::ConfigError(format!("invalid header name: {err}"))
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::ConfigError(format!("invalid header value: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::AuthenticationError("test".to_string()).error_code(),
            "AUTHENTICATION_ERROR"
        );
        assert_eq!(
            Error::HttpError("test".to_string()).error_code(),
            "HTTP_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            Error::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            Error::InvalidRequest("test".to_string()).error_code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(Error::Io("test".to_string()).error_code(), "IO_ERROR");
        assert_eq!(
            Error::InvalidEndpoint("test".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("missing method".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing method");

        let err = Error::AuthenticationError("no token".to_string());
        assert_eq!(err.to_string(), "Authentication error: no token");
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::HttpError("x".to_string()).is_transport());
        assert!(Error::Timeout("x".to_string()).is_transport());
        assert!(Error::NotFound("x".to_string()).is_transport());
        assert!(Error::ParseError("x".to_string()).is_transport());
        assert!(Error::Io("x".to_string()).is_transport());

        assert!(!Error::ConfigError("x".to_string()).is_transport());
        assert!(!Error::AuthenticationError("x".to_string()).is_transport());
        assert!(!Error::ValidationError("x".to_string()).is_transport());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let ops_err: Error = err.into();
        assert!(matches!(ops_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let ops_err: Error = err.into();
        assert!(matches!(ops_err, Error::ParseError(_)));
    }

    #[test]
    fn test_from_invalid_header_name() {
        let err = reqwest::header::HeaderName::from_bytes(b"bad header").unwrap_err();
        let ops_err: Error = err.into();
        assert!(matches!(ops_err, Error::ConfigError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::NotFound("test".to_string());
        let err2 = Error::NotFound("test".to_string());
        let err3 = Error::NotFound("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
