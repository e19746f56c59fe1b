//! Single entry point for obtaining a Graph token.

use reqwest::header::HeaderMap;

use crate::error::{AuthError, Result};
use crate::interactive::{InteractiveFlow, SignInPrompt};
use crate::managed::ManagedTokenSource;
use crate::mode::AuthMode;
use crate::session::{AccessToken, AuthSession};

/// Outcome of a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Ready(AccessToken),
    /// The user has to sign in first. Not an error.
    Pending,
}

impl Acquisition {
    pub fn token(&self) -> Option<&AccessToken> {
        match self {
            Acquisition::Ready(token) => Some(token),
            Acquisition::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Acquisition::Pending)
    }
}

/// The strategy chosen at startup.
#[derive(Debug, Clone)]
pub enum AuthResolver {
    Managed(ManagedTokenSource),
    Interactive(InteractiveFlow),
}

impl AuthResolver {
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthResolver::Managed(_) => AuthMode::Managed,
            AuthResolver::Interactive(_) => AuthMode::Interactive,
        }
    }

    /// Get a token for the current request without prompting.
    ///
    /// `headers` are the inbound request headers; pass an empty map when
    /// there is no inbound request.
    pub async fn acquire(
        &self,
        session: &mut AuthSession,
        headers: &HeaderMap,
    ) -> Result<Acquisition> {
        match self {
            AuthResolver::Managed(source) => match source.acquire(headers)? {
                Some(token) => {
                    session.complete(token.clone(), source.account(headers));
                    Ok(Acquisition::Ready(token))
                }
                None => Ok(Acquisition::Pending),
            },
            AuthResolver::Interactive(flow) => flow.acquire_silent(session).await,
        }
    }

    /// Explicit sign-in. Only meaningful in interactive mode.
    pub async fn sign_in(
        &self,
        session: &mut AuthSession,
        prompt: &dyn SignInPrompt,
    ) -> Result<AccessToken> {
        match self {
            AuthResolver::Managed(_) => Err(AuthError::InvalidRequest(
                "sign-in is handled by the hosting platform".to_string(),
            )),
            AuthResolver::Interactive(flow) => flow.sign_in(session, prompt).await,
        }
    }

    pub async fn sign_out(&self, session: &mut AuthSession) -> Result<()> {
        match self {
            AuthResolver::Managed(_) => {
                session.sign_out();
                Ok(())
            }
            AuthResolver::Interactive(flow) => flow.sign_out(session).await,
        }
    }
}
