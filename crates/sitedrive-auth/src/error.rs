//! Error types for authentication.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while acquiring a token.
///
/// None of these are fatal: a failed acquisition leaves the caller signed out
/// and the action can be retried.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The deployment promised something it did not deliver, or required
    /// settings are missing.
    #[error("Authentication misconfigured: {0}")]
    Misconfigured(String),

    /// Network/HTTP error talking to the identity provider.
    #[error("Network error: {0}")]
    Network(String),

    /// The identity provider returned an OAuth error response.
    #[error("Identity provider error: {error}: {description}")]
    Provider { error: String, description: String },

    /// The user abandoned or declined the sign-in.
    #[error("Sign-in cancelled: {0}")]
    Cancelled(String),

    /// The `state` echoed back by the provider did not match the request.
    #[error("State mismatch in sign-in response")]
    StateMismatch,

    /// The provider's response could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid request or input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Token cache could not be read or written.
    #[error("Token cache error: {0}")]
    Cache(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}
