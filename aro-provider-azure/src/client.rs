//! Azure Resource Manager REST client
//!
//! [`RestClient`] is the seam between the provider and the network. The
//! reqwest-backed [`HttpRestClient`] adds bearer authentication and follows
//! Azure long-running operations until they settle.
//!
//! References:
//! - [Azure async operations](https://learn.microsoft.com/en-us/azure/azure-resource-manager/management/async-operations)

use std::time::Duration;

use aro_core::provider::BoxFuture;
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::Instant;

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// HTTP verbs used against the resource provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// One call against the resource provider
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    /// Path relative to the base URL, without a leading slash
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Status codes that count as success
    pub expected_status: Vec<u16>,
    /// Total time for the call, long-running operation included
    pub timeout: Option<Duration>,
    /// Set to follow long-running operations at this interval
    pub poll_interval: Option<Duration>,
}

impl RestRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            expected_status: vec![200],
            timeout: None,
            poll_interval: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::Put, path);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_expected_status(mut self, status: &[u16]) -> Self {
        self.expected_status = status.to_vec();
        self
    }

    /// Follow a long-running operation for at most `timeout`
    pub fn with_long_running(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = Some(timeout);
        self.poll_interval = Some(poll_interval);
        self
    }

    fn accepts(&self, status: u16) -> bool {
        self.expected_status.contains(&status)
    }
}

/// Raw response; the body is parsed by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Errors from the REST client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("long-running operation ended with status {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("cannot build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedStatus { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Transport used by [`crate::AroProvider`]
pub trait RestClient: Send + Sync {
    fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RestResponse, ClientError>>;
}

/// Terminal state of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
enum OperationState {
    InProgress,
    Succeeded,
    Failed { status: String, message: String },
}

/// reqwest-backed client for Azure Resource Manager
pub struct HttpRestClient {
    http_client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for HttpRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpRestClient {
    /// Create a client; `verify_tls = false` accepts self-signed certificates
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        verify_tls: bool,
    ) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn auth_header(&self) -> String {
        if self.access_token.starts_with("Bearer ") {
            self.access_token.clone()
        } else {
            format!("Bearer {}", self.access_token)
        }
    }

    fn make_request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let request = match method {
            Method::Get => self.http_client.get(url),
            Method::Put => self.http_client.put(url),
            Method::Delete => self.http_client.delete(url),
        };
        request
            .header(AUTHORIZATION, self.auth_header())
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
    }

    async fn execute(
        &self,
        request: &RestRequest,
    ) -> Result<(StatusCode, HeaderMap, String), ClientError> {
        let url = self.url_for(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.make_request(request.method, &url).query(&request.query);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok((status, headers, body))
    }

    async fn send_request(&self, request: RestRequest) -> Result<RestResponse, ClientError> {
        let started = Instant::now();
        let (status, headers, body) = self.execute(&request).await?;

        if !request.accepts(status.as_u16()) {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        let initial = RestResponse::new(status.as_u16(), body);

        let (Some(interval), Some(operation_url)) =
            (request.poll_interval, operation_url(status, &headers))
        else {
            return Ok(initial);
        };
        let deadline = request.timeout.map(|timeout| started + timeout);

        if !self.wait_for_operation(&operation_url, interval, deadline).await? {
            warn!(
                "{} {} still running when the timeout elapsed",
                request.method, request.path
            );
            return Ok(initial);
        }

        match request.method {
            Method::Put => {
                let refresh = RestRequest {
                    method: Method::Get,
                    body: None,
                    expected_status: vec![200],
                    poll_interval: None,
                    ..request
                };
                let (status, _, body) = self.execute(&refresh).await?;
                if !refresh.accepts(status.as_u16()) {
                    return Err(ClientError::UnexpectedStatus {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(RestResponse::new(status.as_u16(), body))
            }
            _ => Ok(initial),
        }
    }

    /// Poll an operation URL; returns false if the deadline passed first
    async fn wait_for_operation(
        &self,
        operation_url: &str,
        interval: Duration,
        deadline: Option<Instant>,
    ) -> Result<bool, ClientError> {
        loop {
            if deadline.is_some_and(|d| Instant::now() + interval > d) {
                return Ok(false);
            }
            tokio::time::sleep(interval).await;

            let response = self.make_request(Method::Get, operation_url).send().await?;
            let status = response.status();
            let body = response.text().await?;
            debug!("operation {} answered {}", operation_url, status);

            match operation_state(status, &body) {
                OperationState::InProgress => continue,
                OperationState::Succeeded => return Ok(true),
                OperationState::Failed { status, message } => {
                    return Err(ClientError::OperationFailed { status, message });
                }
            }
        }
    }
}

impl RestClient for HttpRestClient {
    fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RestResponse, ClientError>> {
        Box::pin(self.send_request(request))
    }
}

/// URL to follow for a long-running operation, if the response started one
fn operation_url(status: StatusCode, headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    match status.as_u16() {
        201 => header(ASYNC_OPERATION),
        202 => header(ASYNC_OPERATION).or_else(|| header(LOCATION.as_str())),
        _ => None,
    }
}

/// Interpret one poll response
///
/// Azure-AsyncOperation URLs answer with a `status` field. Location URLs
/// answer 202 while running and 200/204 once done.
fn operation_state(status: StatusCode, body: &str) -> OperationState {
    if status == StatusCode::ACCEPTED {
        return OperationState::InProgress;
    }
    if !status.is_success() {
        return OperationState::Failed {
            status: status.as_u16().to_string(),
            message: body.to_string(),
        };
    }

    let document: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    match document.get("status").and_then(Value::as_str) {
        None | Some("Succeeded") => OperationState::Succeeded,
        Some(state @ ("Failed" | "Canceled")) => OperationState::Failed {
            status: state.to_string(),
            message: document
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        Some(_) => OperationState::InProgress,
    }
}
