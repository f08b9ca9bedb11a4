//! Request execution.
//!
//! [`RequestExecutor`] is the seam between request construction and the network.
//! [`HttpExecutor`] is the default `reqwest` implementation.

use crate::client::{HttpConfig, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::config::OpsConfig;
use crate::error::{Error, Result};
use crate::request::{Credential, RequestDescriptor};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("vrops-core/", env!("CARGO_PKG_VERSION"));

/// Parsed response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// A JSON document.
    Json(serde_json::Value),
    /// Any other payload (e.g. XML), as text.
    Text(String),
}

impl ResponseBody {
    /// Decode `bytes` according to the response content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if a JSON content type carries malformed JSON, or any
    /// other payload is not valid UTF-8.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Result<Self> {
        let is_json = content_type.is_some_and(|ct| ct.contains("json"));
        if is_json {
            let value = serde_json::from_slice(bytes)
                .map_err(|err| Error::ParseError(format!("malformed JSON response: {err}")))?;
            Ok(Self::Json(value))
        } else {
            let text = std::str::from_utf8(bytes)
                .map_err(|err| Error::ParseError(format!("response is not UTF-8: {err}")))?;
            Ok(Self::Text(text.to_string()))
        }
    }
}

/// Issues an assembled request.
///
/// Implementations own cancellation and timeouts. Errors are transport errors and are
/// returned to the caller without retry.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute `request` and return the parsed response body.
    ///
    /// # Errors
    ///
    /// Returns a transport error on connection failure, a non-2xx status, a malformed
    /// payload, or when the output target cannot be written.
    async fn execute(&self, request: RequestDescriptor) -> Result<ResponseBody>;
}

/// `reqwest`-backed [`RequestExecutor`].
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: Client,
}

impl HttpExecutor {
    /// Build an executor using the timeout and TLS settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA certificate cannot be loaded or the HTTP
    /// client cannot be created.
    pub fn from_config(config: &OpsConfig) -> Result<Self> {
        let http_config = HttpConfig::new().with_timeout(config.timeout());
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(http_config.timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(http_config.pool_idle_timeout)
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host);

        if !config.tls_verify {
            warn!("TLS verification disabled for vROps client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &config.tls_ca_cert {
            debug!("loading CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: RequestDescriptor) -> Result<ResponseBody> {
        let mut builder = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());

        if let Some(Credential::Basic { username, password }) = request.credential() {
            builder = builder.basic_auth(username, Some(password.expose_secret()));
        }

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        info!(method = %request.method(), path = %request.url().path(), "Sending vROps request");

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_to_error(status, message));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if let Some(path) = request.output_target() {
            tokio::fs::write(path, &bytes).await.map_err(|err| {
                Error::Io(format!("Failed to write response to {}: {err}", path.display()))
            })?;
            debug!(path = %path.display(), bytes = bytes.len(), "Wrote response body");
        }

        ResponseBody::from_bytes(&bytes, content_type.as_deref())
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidRequest(format!("vROps authentication failed: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("vROps temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("vROps server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("vROps error {status}: {text}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBuilder;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_executor(server: &MockServer) -> HttpExecutor {
        let config = OpsConfig::new(server.uri()).unwrap();
        HttpExecutor::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn execute_get_with_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/suite-api/api/resources"))
            .and(query_param("resourceKind", "VirtualMachine"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"page": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resourceList": []})))
            .expect(1)
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!(
                "{}/suite-api/api/resources?resourceKind=VirtualMachine",
                server.uri()
            ))
            .accept("application/json")
            .body(Some(json!({"page": 0})))
            .assemble()
            .unwrap();

        let body = test_executor(&server).execute(request).await.unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"resourceList": []})));
    }

    #[tokio::test]
    async fn execute_applies_basic_credential() {
        let server = MockServer::start().await;
        // admin:secret
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("pong", "text/plain"))
            .expect(1)
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/ping", server.uri()))
            .credential(Credential::basic("admin", "secret"))
            .assemble()
            .unwrap();

        let body = test_executor(&server).execute(request).await.unwrap();
        assert_eq!(body, ResponseBody::Text("pong".to_string()));
    }

    #[tokio::test]
    async fn execute_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/missing", server.uri()))
            .assemble()
            .unwrap();

        let err = test_executor(&server).execute(request).await.unwrap_err();
        assert_eq!(err, Error::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn execute_maps_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/suite-api/api/resources", server.uri()))
            .assemble()
            .unwrap();

        let err = test_executor(&server).execute(request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn execute_does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/suite-api/api/resources", server.uri()))
            .assemble()
            .unwrap();

        let err = test_executor(&server).execute(request).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn execute_reports_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
            .mount(&server)
            .await;

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/suite-api/api/resources", server.uri()))
            .assemble()
            .unwrap();

        let err = test_executor(&server).execute(request).await.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn execute_writes_output_target() {
        let server = MockServer::start().await;
        let xml = "<ops:resources xmlns:ops=\"http://webservice.vmware.com/vRealizeOpsMgr/1.0/\"/>";
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("resources.xml");

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/suite-api/api/resources", server.uri()))
            .accept("application/xml")
            .output_target(Some(out.clone()))
            .assemble()
            .unwrap();

        let body = test_executor(&server).execute(request).await.unwrap();
        assert_eq!(body, ResponseBody::Text(xml.to_string()));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), xml);
    }

    #[tokio::test]
    async fn execute_connection_refused_is_transport_error() {
        let config = OpsConfig::new("http://127.0.0.1:9").unwrap();
        let executor = HttpExecutor::from_config(&config).unwrap();
        let request = RequestBuilder::new()
            .method("GET")
            .url("http://127.0.0.1:9/suite-api/api/resources")
            .assemble()
            .unwrap();

        let err = executor.execute(request).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn response_body_from_bytes() {
        assert_eq!(
            ResponseBody::from_bytes(br#"{"a":1}"#, Some("application/json;charset=UTF-8")).unwrap(),
            ResponseBody::Json(json!({"a": 1}))
        );
        assert_eq!(
            ResponseBody::from_bytes(b"<a/>", Some("application/xml")).unwrap(),
            ResponseBody::Text("<a/>".to_string())
        );
        assert_eq!(
            ResponseBody::from_bytes(b"plain", None).unwrap(),
            ResponseBody::Text("plain".to_string())
        );
    }

    #[test]
    fn response_body_rejects_invalid_utf8() {
        let latin1 = b"<ops:name>caf\xe9</ops:name>";
        let err = ResponseBody::from_bytes(latin1, Some("application/xml")).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn execute_writes_output_target_before_rejecting_invalid_utf8() {
        let server = MockServer::start().await;
        let payload: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xe9</a>";
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(payload, "application/xml"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("resources.xml");

        let request = RequestBuilder::new()
            .method("GET")
            .url(format!("{}/suite-api/api/resources", server.uri()))
            .output_target(Some(out.clone()))
            .assemble()
            .unwrap();

        let err = test_executor(&server).execute(request).await.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert_eq!(std::fs::read(&out).unwrap(), payload);
    }
}
