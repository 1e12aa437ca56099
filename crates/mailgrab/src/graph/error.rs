//! Graph API and identity provider error types.

use thiserror::Error;

/// Errors from a single Graph API call.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Request(String),

    /// The response carried an API-level `error` object.
    #[error("Graph API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Non-success status without a recognizable error object.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors from the client-credentials token exchange. Always fatal.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider could not be reached.
    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),

    /// The identity provider rejected the credentials.
    #[error("Token request rejected ({status}) {error}: {description}")]
    Rejected {
        status: u16,
        error: String,
        description: String,
    },

    /// The token endpoint answered with something other than a token.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

/// Result type for Graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
