//! Async client for the Conductor REST API.
//!
//! Operations are grouped the way the server groups its resources:
//!
//! - [`metadata`] - workflow and task definitions
//! - [`tasks`] - task polling, updates and queue introspection
//! - [`workflows`] - workflow execution and lifecycle commands
//!
//! Each group exposes pure request constructors returning an [`ApiRequest`],
//! and [`ConductorClient`] has one async method per operation that builds
//! the request, sends it and decodes the response.
//!
//! Every call issues exactly one HTTP request. There are no retries and no
//! local validation: whatever the server rejects comes back as
//! [`Error::Transport`] with the status code and raw body.

pub mod http_logging_middleware;
pub mod http_middleware;
pub mod metadata;
pub mod request;
pub mod tasks;
pub mod workflows;

pub use request::{ApiRequest, ApiResponse};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use http_middleware::{
    HttpMiddleware, HttpMiddlewareChain, HttpMiddlewareContext, HttpRequest, HttpResponse,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Version used when an operation's `version` argument is `None`.
pub const DEFAULT_VERSION: u32 = 1;

/// Client for one Conductor server.
///
/// Cloning is cheap; clones share the connection pool, configuration and
/// middleware chain. Calls may run concurrently without coordination.
///
/// # Examples
///
/// ```rust,no_run
/// use conductor_client::{ClientConfig, ConductorClient};
/// use serde_json::json;
///
/// # async fn example() -> conductor_client::Result<()> {
/// let client = ConductorClient::new(ClientConfig::new("http://localhost:8080/api"))?;
///
/// let workflow_id = client
///     .start_workflow("order_flow", Some(2), Some("order-42"), Some(&json!({"orderId": 42})))
///     .await?;
/// let workflow = client.get_workflow(&workflow_id, true).await?;
/// println!("{} is {:?}", workflow.workflow_id, workflow.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConductorClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    default_headers: HeaderMap,
    middleware: Arc<HttpMiddlewareChain>,
}

impl ConductorClient {
    /// Create a client from a configuration.
    ///
    /// Fails if the base URL is not an absolute `http`/`https` URL or a
    /// configured header is not a valid HTTP header.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "Unsupported URL scheme '{}' in base_url",
                base.scheme()
            )));
        }

        let default_headers = header_map(&config)?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(base_url = %config.base_url, "Created Conductor client");

        Ok(Self {
            http,
            config: Arc::new(config),
            default_headers,
            middleware: Arc::new(HttpMiddlewareChain::new()),
        })
    }

    /// Add HTTP middleware to this client.
    pub fn with_middleware(mut self, middleware: Arc<dyn HttpMiddleware>) -> Self {
        Arc::make_mut(&mut self.middleware).add(middleware);
        self
    }

    /// Configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send an arbitrary request through this client's transport and
    /// middleware.
    ///
    /// Useful for endpoints without a dedicated method. Non-2xx responses
    /// fail with [`Error::Transport`].
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.send("execute", request).await
    }

    pub(crate) async fn send(&self, operation: &str, request: ApiRequest) -> Result<ApiResponse> {
        let url = request.url(&self.config.base_url)?;
        let mut http_request =
            HttpRequest::new(request.method.to_string(), url.to_string(), request.body_bytes()?);
        http_request.headers = self.default_headers.clone();

        let context =
            HttpMiddlewareContext::new(http_request.url.clone(), http_request.method.clone())
                .with_operation(operation);
        self.middleware
            .process_request(&mut http_request, &context)
            .await?;

        let method = Method::from_bytes(http_request.method.as_bytes())
            .map_err(|e| Error::Middleware(format!("Invalid HTTP method: {}", e)))?;
        let url = Url::parse(&http_request.url)?;

        tracing::debug!(operation, %method, %url, "Sending Conductor request");

        let mut builder = self
            .http
            .request(method, url)
            .headers(http_request.headers);
        if !http_request.body.is_empty() {
            builder = builder.body(http_request.body);
        }
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        let mut http_response = HttpResponse {
            status,
            headers,
            body,
        };
        self.middleware
            .process_response(&mut http_response, &context)
            .await?;

        if !http_response.is_success() {
            let body = String::from_utf8_lossy(&http_response.body).into_owned();
            tracing::warn!(operation, status = http_response.status, "Conductor request failed");
            return Err(Error::Transport {
                status: http_response.status,
                body,
            });
        }

        Ok(ApiResponse {
            status: http_response.status,
            headers: http_response.headers,
            body: http_response.body,
        })
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: ApiRequest,
    ) -> Result<T> {
        self.send(operation, request).await?.json()
    }

    pub(crate) async fn send_text(&self, operation: &str, request: ApiRequest) -> Result<String> {
        Ok(self.send(operation, request).await?.text())
    }

    pub(crate) async fn send_unit(&self, operation: &str, request: ApiRequest) -> Result<()> {
        self.send(operation, request).await.map(|_| ())
    }
}

impl std::fmt::Debug for ConductorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConductorClient")
            .field("base_url", &self.config.base_url)
            .field("middleware", &self.middleware)
            .finish()
    }
}

fn header_map(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in config.default_headers() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| Error::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
