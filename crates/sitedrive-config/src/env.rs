//! Environment variable overlay.
//!
//! Applied after the file layers. Variable names follow the hosting platform
//! and the identity provider's conventions so an existing `.env` works as-is.

use crate::{
    ConfigError, GraphConfig, IdentityConfig, PlatformConfig, Result, SiteConfig, SiteDriveConfig,
};

pub const CLIENT_ID: &str = "CLIENT_ID";
pub const TENANT_ID: &str = "TENANT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const AUTHORITY: &str = "AUTHORITY";
pub const REDIRECT_URI: &str = "REDIRECT_URI";
pub const GRAPH_API_ENDPOINT: &str = "GRAPH_API_ENDPOINT";
pub const MAX_PAGES: &str = "SITEDRIVE_MAX_PAGES";
pub const SHAREPOINT_SITE_URL: &str = "SHAREPOINT_SITE_URL";
/// Set to `True` by the platform when it fronts the app with authentication.
pub const WEBSITE_AUTH_ENABLED: &str = "WEBSITE_AUTH_ENABLED";
pub const INJECTED_TOKEN: &str = "MS_TOKEN_AAD_ACCESS_TOKEN";

/// Overlay values from the process environment.
pub fn apply_process_env(config: &mut SiteDriveConfig) -> Result<()> {
    apply_env_with(config, |key| std::env::var(key).ok())
}

/// Overlay values from an arbitrary lookup. Empty values are ignored.
pub fn apply_env_with<F>(config: &mut SiteDriveConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let identity = config.identity.get_or_insert_with(IdentityConfig::default);
    if let Some(v) = get(CLIENT_ID) {
        identity.client_id = Some(v);
    }
    if let Some(v) = get(TENANT_ID) {
        identity.tenant_id = Some(v);
    }
    if let Some(v) = get(CLIENT_SECRET) {
        identity.client_secret = Some(v);
    }
    if let Some(v) = get(AUTHORITY) {
        identity.authority = Some(v);
    }
    if let Some(v) = get(REDIRECT_URI) {
        identity.redirect_uri = Some(v);
    }

    let graph = config.graph.get_or_insert_with(GraphConfig::default);
    if let Some(v) = get(GRAPH_API_ENDPOINT) {
        graph.endpoint = Some(v);
    }
    if let Some(v) = get(MAX_PAGES) {
        let pages = v.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
            var: MAX_PAGES.to_string(),
            value: v.clone(),
        })?;
        graph.max_pages = Some(pages);
    }

    if let Some(v) = get(SHAREPOINT_SITE_URL) {
        config.site.get_or_insert_with(SiteConfig::default).default_url = Some(v);
    }

    let platform = config.platform.get_or_insert_with(PlatformConfig::default);
    if let Some(v) = get(WEBSITE_AUTH_ENABLED) {
        platform.auth_enabled = parse_flag(&v);
    }
    if let Some(v) = get(INJECTED_TOKEN) {
        platform.injected_token = Some(v);
    }

    Ok(())
}

/// The platform writes `True`; accept the usual spellings of true.
fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
