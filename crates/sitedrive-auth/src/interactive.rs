//! Interactive sign-in with silent reuse.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AuthError, Result};
use crate::exchange::SharedTokenExchange;
use crate::oauth::{self, OAuthConfig, PkceChallenge, TokenResponse};
use crate::resolver::Acquisition;
use crate::session::{AccessToken, Account, AuthSession};
use crate::token_cache::{CachedSession, SharedTokenCache};

/// Shows the user the authorization URL and hands back where the browser
/// was redirected.
#[async_trait]
pub trait SignInPrompt: Send + Sync {
    /// Returns the redirect URL (or its query string).
    async fn authorize(&self, authorization_url: &str) -> Result<String>;
}

/// Authorization code + PKCE sign-in backed by a token cache.
#[derive(Debug, Clone)]
pub struct InteractiveFlow {
    config: OAuthConfig,
    exchange: SharedTokenExchange,
    cache: SharedTokenCache,
}

impl InteractiveFlow {
    pub fn new(config: OAuthConfig, exchange: SharedTokenExchange, cache: SharedTokenCache) -> Self {
        Self {
            config,
            exchange,
            cache,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn cache(&self) -> &SharedTokenCache {
        &self.cache
    }

    /// Token without user interaction, or `Pending` if a sign-in is needed.
    ///
    /// Tries the session's own token, then the cached account, then a refresh
    /// of the cached account. Failures along the way are recorded on the
    /// session and reported as `Pending`.
    pub async fn acquire_silent(&self, session: &mut AuthSession) -> Result<Acquisition> {
        if let Some(token) = session.token().filter(|t| !t.is_expired()) {
            return Ok(Acquisition::Ready(token.clone()));
        }

        let cached = match self.cache.load().await {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                tracing::debug!("no cached account; sign-in required");
                return Ok(Acquisition::Pending);
            }
            Err(e) => {
                tracing::warn!("token cache unreadable: {}", e);
                session.fail(e.to_string());
                return Ok(Acquisition::Pending);
            }
        };

        if !cached.access_token.is_expired() {
            tracing::debug!("reusing cached token");
            session.complete(cached.access_token.clone(), cached.account);
            return Ok(Acquisition::Ready(cached.access_token));
        }

        let Some(refresh_token) = cached.refresh_token.as_deref() else {
            tracing::debug!("cached token expired and no refresh token available");
            return Ok(Acquisition::Pending);
        };

        tracing::info!("Refreshing access token");
        match self.exchange.refresh(refresh_token).await {
            Ok(response) => {
                let account = response.account().or(cached.account.clone());
                let token = self
                    .store(&response, account.clone(), Some(refresh_token))
                    .await;
                session.complete(token.clone(), account);
                Ok(Acquisition::Ready(token))
            }
            Err(e) => {
                tracing::warn!("silent token refresh failed: {}", e);
                session.fail(e.to_string());
                Ok(Acquisition::Pending)
            }
        }
    }

    /// Run a full browser sign-in.
    pub async fn sign_in(
        &self,
        session: &mut AuthSession,
        prompt: &dyn SignInPrompt,
    ) -> Result<AccessToken> {
        session.begin_sign_in();
        match self.run_sign_in(prompt).await {
            Ok((token, account)) => {
                if let Some(account) = &account {
                    tracing::info!(account = %account, "signed in");
                }
                session.complete(token.clone(), account);
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("sign-in failed: {}", e);
                session.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_sign_in(
        &self,
        prompt: &dyn SignInPrompt,
    ) -> Result<(AccessToken, Option<Account>)> {
        let pkce = PkceChallenge::generate();
        let state = oauth::generate_state();
        let url = oauth::build_authorization_url(&self.config, &pkce.challenge, &state);

        let redirect = prompt.authorize(&url).await?;
        let response = oauth::parse_redirect(&redirect)?;
        if response.state != state {
            return Err(AuthError::StateMismatch);
        }

        let tokens = self
            .exchange
            .exchange_code(&response.code, &pkce.verifier)
            .await?;
        let account = tokens.account();
        let token = self.store(&tokens, account.clone(), None).await;
        Ok((token, account))
    }

    /// App-only sign-in with the client secret.
    pub async fn sign_in_as_application(&self, session: &mut AuthSession) -> Result<AccessToken> {
        session.begin_sign_in();
        match self.exchange.client_credentials().await {
            Ok(response) => {
                let account = Account::new("Application", self.config.client_id.clone());
                let token = self.store(&response, Some(account.clone()), None).await;
                session.complete(token.clone(), Some(account));
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("application sign-in failed: {}", e);
                session.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Clear the session and forget the cached account.
    pub async fn sign_out(&self, session: &mut AuthSession) -> Result<()> {
        session.sign_out();
        self.cache.clear().await
    }

    /// Cache the new token. A cache write failure only costs a later prompt.
    async fn store(
        &self,
        response: &TokenResponse,
        account: Option<Account>,
        previous_refresh: Option<&str>,
    ) -> AccessToken {
        let token = response.access_token_at(Utc::now());
        let refresh_token = response
            .refresh_token
            .clone()
            .or_else(|| previous_refresh.map(str::to_string));
        let cached = CachedSession::new(token.clone(), refresh_token, account);
        if let Err(e) = self.cache.save(&cached).await {
            tracing::warn!("could not persist token cache: {}", e);
        }
        token
    }
}
