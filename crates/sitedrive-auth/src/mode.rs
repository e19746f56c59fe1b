//! Authentication mode selection.

use reqwest::header::HeaderMap;

/// Which token strategy is in force. Resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// The hosting platform injects tokens; no sign-in UI.
    Managed,
    /// Browser-based sign-in with a local token cache.
    Interactive,
}

impl AuthMode {
    pub fn detect(signals: &EnvironmentSignals) -> Self {
        if detect_environment(signals) {
            AuthMode::Managed
        } else {
            AuthMode::Interactive
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Managed => write!(f, "managed platform"),
            AuthMode::Interactive => write!(f, "interactive"),
        }
    }
}

/// Declared inputs to mode detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentSignals {
    /// The platform's "authentication enabled" flag.
    pub auth_enabled: bool,
    /// The inbound request carries the injected token header.
    pub injected_header_present: bool,
}

impl EnvironmentSignals {
    pub fn from_headers(auth_enabled: bool, headers: &HeaderMap, token_header: &str) -> Self {
        Self {
            auth_enabled,
            injected_header_present: headers.contains_key(token_header),
        }
    }
}

/// True when the platform handles authentication for us.
pub fn detect_environment(signals: &EnvironmentSignals) -> bool {
    signals.auth_enabled || signals.injected_header_present
}
