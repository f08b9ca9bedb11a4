//! Request assembly.
//!
//! [`RequestBuilder`] gathers the optional components of a request and
//! [`RequestBuilder::assemble`] validates them into an immutable [`RequestDescriptor`]. No
//! network I/O happens here; the descriptor is handed to a
//! [`RequestExecutor`](crate::executor::RequestExecutor).
//!
//! Headers and bodies routinely carry tokens and passwords. Nothing in this module logs
//! them, and the `Debug` output of a descriptor redacts the authorization header, the
//! credential and the body. Callers that dump requests while debugging must assume the
//! wire-level request still contains secrets.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// Opaque credential attached to a request.
pub enum Credential {
    /// HTTP basic authentication.
    Basic {
        /// Login name.
        username: String,
        /// Password, never printed.
        password: SecretString,
    },
}

impl Credential {
    /// Create a basic-auth credential.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// A validated request, ready to execute.
pub struct RequestDescriptor {
    method: Method,
    url: Url,
    headers: HeaderMap,
    credential: Option<Credential>,
    body: Option<serde_json::Value>,
    output_target: Option<PathBuf>,
}

impl RequestDescriptor {
    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute request URL including the query string.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers; empty when none were supplied.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Convenience lookup of a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Credential, if one was supplied.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// JSON body, if one was supplied.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// File the response body should be written to.
    #[must_use]
    pub fn output_target(&self) -> Option<&Path> {
        self.output_target.as_deref()
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("credential", &self.credential)
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .field("output_target", &self.output_target)
            .finish()
    }
}

/// Collects the sparse components of a request.
///
/// Only `method` and `url` are mandatory. Everything else is left unset unless supplied
/// with a non-empty value.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    url: Option<String>,
    headers: HeaderMap,
    credential: Option<Credential>,
    body: Option<serde_json::Value>,
    output_target: Option<PathBuf>,
    invalid_header: Option<Error>,
}

impl RequestBuilder {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method, e.g. `Method::GET` or `"GET"`.
    #[must_use]
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        self.method = Some(method.as_ref().to_string());
        self
    }

    /// Set the absolute URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set a header. A later call with the same name replaces the earlier value.
    #[must_use]
    pub fn header(self, name: &str, value: &str) -> Self {
        self.insert_header(name, value, false)
    }

    /// Set a header whose value must not appear in debug output.
    #[must_use]
    pub fn sensitive_header(self, name: &str, value: &SecretString) -> Self {
        self.insert_header(name, value.expose_secret(), true)
    }

    /// Set `Accept` to the given media type.
    #[must_use]
    pub fn accept(self, media_type: &str) -> Self {
        self.header(ACCEPT.as_str(), media_type)
    }

    /// Set `Authorization: <scheme> <token>`, marked sensitive.
    #[must_use]
    pub fn authorization(self, scheme: &str, token: &SecretString) -> Self {
        let value = SecretString::from(format!("{scheme} {}", token.expose_secret()));
        self.sensitive_header(AUTHORIZATION.as_str(), &value)
    }

    /// Attach a credential.
    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Attach a JSON body. `None` and JSON `null` leave the body unset.
    #[must_use]
    pub fn body(mut self, body: Option<serde_json::Value>) -> Self {
        self.body = body.filter(|value| !value.is_null());
        self
    }

    /// Write the response to `path` once it arrives.
    #[must_use]
    pub fn output_target(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.output_target = path
            .map(Into::into)
            .filter(|path: &PathBuf| !path.as_os_str().is_empty());
        self
    }

    fn insert_header(mut self, name: &str, value: &str, sensitive: bool) -> Self {
        if self.invalid_header.is_some() || value.is_empty() {
            return self;
        }

        let parsed = HeaderName::from_str(name)
            .map_err(Error::from)
            .and_then(|name| Ok((name, HeaderValue::from_str(value)?)));

        match parsed {
            Ok((name, mut value)) => {
                value.set_sensitive(sensitive);
                self.headers.insert(name, value);
            }
            // reported by assemble()
            Err(err) => self.invalid_header = Some(err),
        }
        self
    }

    /// Validate the components and produce a [`RequestDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the method or URL is missing or malformed, or
    /// when a header could not be encoded.
    pub fn assemble(self) -> Result<RequestDescriptor> {
        let method = match self.method.as_deref().map(str::trim) {
            None | Some("") => return Err(Error::ConfigError("missing method".to_string())),
            Some(method) => parse_method(method)?,
        };

        let url = match self.url.as_deref().map(str::trim) {
            None | Some("") => return Err(Error::ConfigError("missing URL".to_string())),
            Some(url) => Url::parse(url)
                .map_err(|err| Error::ConfigError(format!("invalid URL `{url}`: {err}")))?,
        };

        if let Some(err) = self.invalid_header {
            return Err(err);
        }

        debug!(
            %method,
            path = %url.path(),
            headers = self.headers.len(),
            has_body = self.body.is_some(),
            "Assembled request"
        );

        Ok(RequestDescriptor {
            method,
            url,
            headers: self.headers,
            credential: self.credential,
            body: self.body,
            output_target: self.output_target,
        })
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let upper = method.to_ascii_uppercase();
    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" | "TRACE"
        | "CONNECT" => Method::from_bytes(upper.as_bytes())
            .map_err(|err| Error::ConfigError(format!("invalid method `{method}`: {err}"))),
        _ => Err(Error::ConfigError(format!("unsupported method `{method}`"))),
    }
}
