//! Asynchronous resource listing client.

use crate::models::{ResourceList, ResourceQuery};
use crate::Result;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info};
use vrops_core::query::append_query;
use vrops_core::{
    Error, HttpExecutor, OpsConfig, RequestBuilder, RequestDescriptor, RequestExecutor,
};

/// Path of the resource listing endpoint, relative to the server root.
pub const RESOURCES_PATH: &str = "suite-api/api/resources";

/// Builder for [`ResourcesClient`].
pub struct ResourcesClientBuilder {
    config: OpsConfig,
    executor: Option<Arc<dyn RequestExecutor>>,
    token: Option<SecretString>,
}

impl ResourcesClientBuilder {
    /// Create a builder for the given configuration.
    #[must_use]
    pub fn new(config: OpsConfig) -> Self {
        Self {
            config,
            executor: None,
            token: None,
        }
    }

    /// Use a custom executor instead of the default HTTP one.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Configure the authentication token.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_secret_token(SecretString::from(token.into()))
    }

    /// Configure the authentication token from an existing secret.
    #[must_use]
    pub fn with_secret_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the default executor cannot be
    /// created.
    pub fn build(self) -> Result<ResourcesClient> {
        self.config.check()?;
        let executor = match self.executor {
            Some(executor) => executor,
            None => Arc::new(HttpExecutor::from_config(&self.config)?),
        };

        Ok(ResourcesClient {
            config: self.config,
            executor,
            token: self.token,
        })
    }
}

/// Lists resources through `GET /suite-api/api/resources`.
pub struct ResourcesClient {
    config: OpsConfig,
    executor: Arc<dyn RequestExecutor>,
    token: Option<SecretString>,
}

impl ResourcesClient {
    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: OpsConfig) -> ResourcesClientBuilder {
        ResourcesClientBuilder::new(config)
    }

    /// Access the configuration.
    #[must_use]
    pub const fn config(&self) -> &OpsConfig {
        &self.config
    }

    /// Assemble the listing request for `query` without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationError`] when no token is configured, checked before
    /// anything else is built, and [`Error::ConfigError`] if the request is malformed.
    pub fn build_request(&self, query: &ResourceQuery) -> Result<RequestDescriptor> {
        let token = self
            .token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())
            .ok_or_else(|| {
                Error::AuthenticationError("no authentication token supplied".to_string())
            })?;

        let params = query.filter.to_params();
        let query_string = append_query("", params.pairs(), self.config.query_encoding);
        let url = format!("{}{query_string}", self.config.endpoint_url(RESOURCES_PATH)?);
        debug!(
            filters = params.len(),
            paged = query.paging.to_body().is_some(),
            "Building resource query"
        );

        RequestBuilder::new()
            .method(Method::GET)
            .url(url)
            .accept(self.config.format.accept_header())
            .authorization(&self.config.token_scheme, token)
            .body(query.paging.to_body())
            .output_target(query.output.as_deref())
            .assemble()
    }

    /// List resources matching `query`.
    ///
    /// JSON responses are unwrapped to their `resourceList`; XML responses yield their
    /// `ops:resource` elements alongside the original document. Transport errors from the
    /// executor are returned unchanged.
    ///
    /// # Errors
    ///
    /// See [`ResourcesClient::build_request`]; otherwise any error raised by the executor,
    /// or [`Error::ParseError`] if the listing cannot be decoded.
    pub async fn query_resources(&self, query: &ResourceQuery) -> Result<ResourceList> {
        let request = self.build_request(query)?;
        let body = self.executor.execute(request).await?;
        let list = ResourceList::from_response(self.config.format, body)?;

        info!(
            format = %self.config.format,
            resources = list.resources().len(),
            "Fetched resource listing"
        );
        Ok(list)
    }
}
