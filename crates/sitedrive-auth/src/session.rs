//! Caller-owned authentication session.
//!
//! The session holds at most one token and the account it belongs to. It is
//! created by the caller, passed by `&mut` into the resolver, and cleared on
//! sign-out.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are treated as expired.
const EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    secret: String,
    /// `None` when the issuer did not tell us (platform-injected tokens).
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    scope: Option<String>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
            scope: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// The raw token, for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Whether the token is expired or about to expire.
    ///
    /// Tokens without a known expiry are never considered expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => false,
            Some(at) => now >= at - Duration::seconds(EXPIRY_BUFFER_SECS),
        }
    }

    /// Human-readable remaining lifetime.
    pub fn expires_in_display(&self) -> String {
        match self.expires_at {
            None => "unknown".to_string(),
            Some(_) if self.is_expired() => "Expired (will refresh on next use)".to_string(),
            Some(at) => {
                let secs = (at - Utc::now()).num_seconds().max(0);
                format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
            }
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The identity a token was issued to. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub display_name: String,
    pub account_id: String,
}

impl Account {
    pub fn new(display_name: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            account_id: account_id.into(),
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.account_id.is_empty() {
            write!(f, "{}", self.display_name)
        } else {
            write!(f, "{} ({})", self.display_name, self.account_id)
        }
    }
}

/// Sign-in state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    Authenticating,
    SignedIn {
        token: AccessToken,
        account: Option<Account>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::SignedOut => "signed out",
            SessionState::Authenticating => "authenticating",
            SessionState::SignedIn { .. } => "signed in",
        }
    }
}

/// One interactive session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: SessionState,
    last_error: Option<String>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// A fresh session starts signed out.
    pub fn new() -> Self {
        Self {
            state: SessionState::SignedOut,
            last_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn { .. })
    }

    pub fn token(&self) -> Option<&AccessToken> {
        match &self.state {
            SessionState::SignedIn { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        match &self.state {
            SessionState::SignedIn { account, .. } => account.as_ref(),
            _ => None,
        }
    }

    /// Message from the most recent failed acquisition, cleared by the next
    /// attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn begin_sign_in(&mut self) {
        self.state = SessionState::Authenticating;
        self.last_error = None;
    }

    pub(crate) fn complete(&mut self, token: AccessToken, account: Option<Account>) {
        self.state = SessionState::SignedIn { token, account };
        self.last_error = None;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.state = SessionState::SignedOut;
        self.last_error = Some(message.into());
    }

    /// Drop the token and account. Valid from any state.
    pub fn sign_out(&mut self) {
        self.state = SessionState::SignedOut;
        self.last_error = None;
    }
}
