//! HTTP seam for all outbound calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use super::auth::AccessToken;
use super::error::{GraphError, Result};

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP operations used by the pipeline.
///
/// Implementations return `Err` only when no response was received. Any
/// HTTP status, including errors, comes back as an [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with bearer authentication.
    async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse>;

    /// PATCH `url` with a JSON body and bearer authentication.
    async fn patch_json(
        &self,
        url: &str,
        token: &AccessToken,
        body: &serde_json::Value,
    ) -> Result<HttpResponse>;

    /// POST an `application/x-www-form-urlencoded` body, unauthenticated.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// [`Transport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests time out after `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| GraphError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn finish(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GraphError::Request(format!("Failed to read response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, token: &AccessToken) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GraphError::Request(e.to_string()))?;
        Self::finish(response).await
    }

    async fn patch_json(
        &self,
        url: &str,
        token: &AccessToken,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let response = self
            .client
            .patch(url)
            .bearer_auth(token.expose())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| GraphError::Request(e.to_string()))?;
        Self::finish(response).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| GraphError::Request(e.to_string()))?;
        Self::finish(response).await
    }
}
