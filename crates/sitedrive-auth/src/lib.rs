//! Authentication for sitedrive.
//!
//! Exactly one of two strategies produces the bearer token used against the
//! Graph API, chosen once at startup:
//!
//! - **Managed**: the hosting platform authenticates the user and injects an
//!   access token into each inbound request (or the environment).
//! - **Interactive**: an OAuth 2.0 authorization-code + PKCE sign-in in the
//!   user's browser, with a local token cache for silent reuse.
//!
//! # Components
//!
//! - [`mode`]: environment detection and [`AuthMode`] selection
//! - [`managed`]: platform-injected header/environment token
//! - [`oauth`]: PKCE, authorization URL, token endpoint grants
//! - [`exchange`]: the token endpoint seam used by the interactive flow
//! - [`interactive`]: silent reuse, explicit sign-in, sign-out
//! - [`session`]: caller-owned session state machine
//! - [`token_cache`]: persisted account sessions
//! - [`resolver`]: the single entry point tying the strategies together

pub mod error;
pub mod exchange;
pub mod interactive;
pub mod managed;
pub mod mode;
pub mod oauth;
pub mod resolver;
pub mod session;
pub mod token_cache;

pub use error::{AuthError, Result};
pub use exchange::{HttpTokenExchange, SharedTokenExchange, TokenExchange};
pub use interactive::{InteractiveFlow, SignInPrompt};
pub use managed::{ManagedConfig, ManagedTokenSource};
pub use mode::{AuthMode, EnvironmentSignals, detect_environment};
pub use oauth::{OAuthConfig, PkceChallenge, TokenResponse};
pub use resolver::{Acquisition, AuthResolver};
pub use session::{AccessToken, Account, AuthSession, SessionState};
pub use token_cache::{
    CachedSession, FileTokenCache, InMemoryTokenCache, SharedTokenCache, TokenCache,
    create_memory_token_cache, create_token_cache,
};
