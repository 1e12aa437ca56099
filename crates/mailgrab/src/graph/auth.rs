//! OAuth2 client-credentials authentication against the Microsoft identity platform.
//!
//! Every run exchanges the application's client ID and secret for a fresh
//! app-only bearer token. Nothing is cached between runs.

use std::sync::Arc;

use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::sanitize::truncate_body;

use super::error::AuthError;
use super::transport::Transport;

/// Application permission scope for Microsoft Graph.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Short-lived bearer credential presented on every Graph request.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Returns the raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds of the access token.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Error response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,

    #[serde(default)]
    pub error_description: Option<String>,
}

/// Client-credentials token provider.
pub struct ClientCredentialsAuth {
    transport: Arc<dyn Transport>,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl ClientCredentialsAuth {
    pub fn new(
        transport: Arc<dyn Transport>,
        token_url: String,
        client_id: String,
        client_secret: SecretString,
    ) -> Self {
        Self {
            transport,
            token_url,
            client_id,
            client_secret,
        }
    }

    /// Creates a provider for the tenant and application in `config`.
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::new(
            transport,
            config.endpoints.token_url(&config.credentials.tenant_id),
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
        )
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchanges the client credentials for an access token.
    pub async fn acquire(&self) -> Result<AccessToken, AuthError> {
        info!("Requesting app-only access token from {}", self.token_url);

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", GRAPH_SCOPE),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .transport
            .post_form(&self.token_url, &params)
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        let token = parse_token_response(response.status, &response.body)?;

        debug!(
            "Access token received (type: {}, expires in: {}s)",
            token.token_type.as_deref().unwrap_or("unknown"),
            token
                .expires_in
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string())
        );
        info!("Successfully acquired access token");

        Ok(AccessToken::new(token.access_token))
    }
}

/// Interprets a token endpoint response.
fn parse_token_response(status: u16, body: &str) -> Result<TokenResponse, AuthError> {
    let success = (200..300).contains(&status);

    if !success {
        return Err(match serde_json::from_str::<TokenErrorResponse>(body) {
            Ok(err) => AuthError::Rejected {
                status,
                error: err.error,
                description: err
                    .error_description
                    .map(|d| truncate_body(&d))
                    .unwrap_or_default(),
            },
            Err(_) => AuthError::Rejected {
                status,
                error: "http_error".to_string(),
                description: truncate_body(body),
            },
        });
    }

    let token: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::InvalidResponse(format!("{} (body: {})", e, truncate_body(body))))?;

    if token.access_token.is_empty() {
        return Err(AuthError::InvalidResponse(
            "token endpoint returned an empty access_token".to_string(),
        ));
    }

    Ok(token)
}
