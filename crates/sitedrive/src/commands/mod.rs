//! CLI command handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use console::Style;
use reqwest::header::HeaderMap;

use sitedrive_auth::{
    AccessToken, Acquisition, AuthMode, AuthResolver, AuthSession, EnvironmentSignals,
    HttpTokenExchange, InteractiveFlow, ManagedConfig, ManagedTokenSource, OAuthConfig,
};
use sitedrive_client::{GraphClient, SiteReference};
use sitedrive_config::SiteDriveConfig;

pub mod auth;
pub mod get;
pub mod ls;
pub mod search;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration (files, environment, flags).
    pub config: SiteDriveConfig,
    /// Where the token cache and logs live.
    pub data_dir: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
}

impl Context {
    /// Load configuration and apply command-line overrides.
    pub fn load(
        site: Option<String>,
        endpoint: Option<String>,
        json_output: bool,
    ) -> Result<Self> {
        let loaded = sitedrive_config::load_config(None).context("Failed to load configuration")?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        for path in loaded.loaded_from() {
            tracing::debug!(path = %path.display(), "loaded config");
        }

        let mut config = loaded.config;
        if let Some(site) = site.filter(|s| !s.is_empty()) {
            config.site.get_or_insert_with(Default::default).default_url = Some(site);
        }
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            config.graph.get_or_insert_with(Default::default).endpoint = Some(endpoint);
        }

        let data_dir = sitedrive_config::xdg_config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(Self {
            config,
            data_dir,
            json_output,
        })
    }

    /// Signals for mode detection. The CLI has no inbound request, so an
    /// environment-delivered token stands in for the header.
    pub fn environment_signals(&self) -> EnvironmentSignals {
        let platform = self.config.platform();
        EnvironmentSignals {
            auth_enabled: platform.auth_enabled,
            injected_header_present: platform
                .injected_token
                .as_deref()
                .is_some_and(|t| !t.is_empty()),
        }
    }

    /// Build the resolver for the detected mode.
    pub fn resolver(&self) -> Result<AuthResolver> {
        let mode = AuthMode::detect(&self.environment_signals());
        tracing::debug!(%mode, "authentication mode");

        match mode {
            AuthMode::Managed => {
                let platform = self.config.platform();
                Ok(AuthResolver::Managed(ManagedTokenSource::new(
                    ManagedConfig {
                        auth_enabled: platform.auth_enabled,
                        token_header: platform.token_header().to_string(),
                        principal_name_header: platform.principal_name_header().to_string(),
                        principal_id_header: platform.principal_id_header().to_string(),
                        injected_token: platform.injected_token.clone(),
                    },
                )))
            }
            AuthMode::Interactive => {
                let identity = self.config.identity();
                let config = OAuthConfig::new(
                    identity.require_client_id()?,
                    identity.require_tenant_id()?,
                )
                .with_authority(identity.authority())
                .with_redirect_uri(identity.redirect_uri())
                .with_scopes(identity.scopes())
                .with_client_secret(identity.client_secret.clone());

                let exchange = Arc::new(HttpTokenExchange::new(config.clone()));
                let cache = sitedrive_auth::create_token_cache(&self.data_dir);
                Ok(AuthResolver::Interactive(InteractiveFlow::new(
                    config, exchange, cache,
                )))
            }
        }
    }

    /// Get a token without prompting. Prints a sign-in hint and returns
    /// `None` when the user has to sign in first.
    pub async fn acquire_token(&self) -> Result<Option<AccessToken>> {
        let resolver = self.resolver()?;
        let mut session = AuthSession::new();

        match resolver.acquire(&mut session, &HeaderMap::new()).await? {
            Acquisition::Ready(token) => Ok(Some(token)),
            Acquisition::Pending => {
                let yellow = Style::new().yellow();
                eprintln!(
                    "{} Not signed in. Run 'sitedrive auth login' first.",
                    yellow.apply_to("!")
                );
                if let Some(error) = session.last_error() {
                    let dim = Style::new().dim();
                    eprintln!("  {}", dim.apply_to(error));
                }
                Ok(None)
            }
        }
    }

    /// Graph client for `token`, configured from the `[graph]` section.
    pub fn graph_client(&self, token: &AccessToken) -> Result<GraphClient> {
        let graph = self.config.graph();
        GraphClient::builder()
            .base_url(graph.endpoint())
            .access_token(token.secret())
            .timeout(Duration::from_secs(graph.timeout_secs()))
            .max_pages(graph.max_pages())
            .cache_sites(graph.cache_sites())
            .build()
            .context("Failed to create Graph client")
    }

    /// The site to operate on.
    pub fn site(&self) -> Result<SiteReference> {
        let url = self.config.default_site().ok_or_else(|| {
            anyhow::anyhow!("No site configured. Pass --site or set SHAREPOINT_SITE_URL")
        })?;
        Ok(SiteReference::parse(url)?)
    }
}
