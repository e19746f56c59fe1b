//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("Graph request failed with status {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// `error.message` from the body, or the raw body.
        message: String,
        /// The URL that was requested.
        url: String,
    },

    /// A success response lacked a field we need.
    #[error("Response from {url} is missing `{field}`")]
    MissingField { field: &'static str, url: String },

    /// The site URL could not be split into host and path.
    #[error("Invalid site reference: {0}")]
    InvalidSiteReference(String),

    /// A drive path that is empty where a file was expected, or contains `.`/`..`.
    #[error("Invalid drive path: {0:?}")]
    InvalidPath(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a remote error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if the token was rejected or lacks permission.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Graph error envelope: `{"error": {"message": ...}}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
