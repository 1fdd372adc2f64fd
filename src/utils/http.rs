//! HTTP transport for upstream calls.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SearchError;

/// Default request timeout for upstream calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A GET request to the upstream search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<String>,
}

/// Status and raw body of an upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes upstream requests.
///
/// The search client only depends on this trait so tests can substitute
/// an in-memory transport.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, SearchError>;
}

/// Shared reqwest client with a fixed user agent and timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with the given user agent and request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, SearchError> {
        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header(ACCEPT, "application/json");

        if let Some(ref token) = request.bearer_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::UpstreamRequest(format!("Failed to reach CORE: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            SearchError::UpstreamRequest(format!("Failed to read CORE response body: {}", e))
        })?;

        Ok(UpstreamResponse {
            status,
            body: body.to_vec(),
        })
    }
}
