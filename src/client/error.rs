//! Error types for the client module.

use thiserror::Error;

/// Errors that can occur while talking to the analysis service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The deadline elapsed before the request settled.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Transport-level failure (connection refused, reset, DNS, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("HTTP {status}: {}", display_body(.body))]
    HttpStatus {
        /// Status code returned by the service.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON parsing error: {0}")]
    Decode(#[from] serde_json::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

const fn display_body(body: &str) -> &str {
    if body.is_empty() { "request failed" } else { body }
}

/// Convenience result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
