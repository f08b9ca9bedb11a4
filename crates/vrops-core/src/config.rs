//! Configuration structures for vROps clients.
//!
//! [`OpsConfig`] names the server, the response format requested through `Accept`, the
//! token scheme used in `Authorization`, and the TLS and timeout settings of the HTTP
//! client.

use crate::client::DEFAULT_TIMEOUT_SECS;
use crate::query::QueryEncoding;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Authorization scheme for tokens issued by the vROps token endpoint.
pub const DEFAULT_TOKEN_SCHEME: &str = "vRealizeOpsToken";

/// Response format requested from the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
}

impl ResponseFormat {
    /// Returns the format name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Returns the media type sent in the `Accept` header.
    #[must_use]
    pub const fn accept_header(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(Error::ConfigError(format!("Unknown response format: {s}"))),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a vROps client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpsConfig {
    /// Server host name, or a full base URL. A bare host is reached over HTTPS.
    #[validate(length(min = 1))]
    pub host: String,

    /// Response format
    #[serde(default)]
    pub format: ResponseFormat,

    /// Scheme prefixed to the token in the `Authorization` header
    #[serde(default = "default_token_scheme")]
    pub token_scheme: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How filter values are written into the query string
    #[serde(default)]
    pub query_encoding: QueryEncoding,
}

fn default_token_scheme() -> String {
    DEFAULT_TOKEN_SCHEME.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl OpsConfig {
    /// Create a new client configuration for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty or does not form a valid URL.
    pub fn new(host: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            format: ResponseFormat::default(),
            token_scheme: default_token_scheme(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            query_encoding: QueryEncoding::default(),
        };

        config.check()?;
        Ok(config)
    }

    /// Validate field ranges and the resulting base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when a field is out of range, or
    /// [`Error::ConfigError`] when the host does not form a URL.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()?;
        self.base_url()?;
        Ok(())
    }

    /// Set the response format.
    #[must_use]
    pub const fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the token scheme.
    #[must_use]
    pub fn with_token_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.token_scheme = scheme.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the query string encoding.
    #[must_use]
    pub const fn with_query_encoding(mut self, encoding: QueryEncoding) -> Self {
        self.query_encoding = encoding;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL of the server, always ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be turned into a URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = self.host.trim().trim_end_matches('/');
        let raw = if host.contains("://") {
            format!("{host}/")
        } else {
            format!("https://{host}/")
        };
        Url::parse(&raw).map_err(|e| Error::ConfigError(format!("Invalid host `{host}`: {e}")))
    }

    /// Absolute URL of an API path such as `suite-api/api/resources`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or the joined path is invalid.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url()?
            .join(path.trim_start_matches('/'))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid API path `{path}`: {err}")))
    }
}
