//! Token endpoint access behind a trait so the interactive flow can be driven
//! without a live identity provider.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::oauth::{self, OAuthConfig, TokenResponse};

/// Grants the interactive flow needs from the token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync + std::fmt::Debug {
    /// Redeem an authorization code.
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse>;

    /// Redeem a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;

    /// App-only token via the client secret.
    async fn client_credentials(&self) -> Result<TokenResponse>;
}

/// Shared token exchange for use across async contexts.
pub type SharedTokenExchange = Arc<dyn TokenExchange>;

/// Token exchange against the real token endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl HttpTokenExchange {
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        oauth::exchange_code_for_tokens(&self.http, &self.config, code, verifier).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        oauth::refresh_access_token(&self.http, &self.config, refresh_token).await
    }

    async fn client_credentials(&self) -> Result<TokenResponse> {
        oauth::acquire_client_credentials(&self.http, &self.config).await
    }
}
