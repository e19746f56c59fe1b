//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [identity]
//! client_id = "00000000-0000-0000-0000-000000000000"
//! tenant_id = "contoso.onmicrosoft.com"
//!
//! [graph]
//! endpoint = "https://graph.microsoft.com/v1.0"
//! max_pages = 20
//!
//! [site]
//! default_url = "https://contoso.sharepoint.com/sites/demo"
//!
//! [platform]
//! auth_enabled = false
//! ```

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default identity provider authority (tenant id is appended).
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";

/// Default redirect URI registered for public-client sign-in.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Scope requesting every Graph permission granted to the application.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Default Graph REST API base.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on followed `@odata.nextLink` pages.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Header the hosting platform injects with the user's access token.
pub const DEFAULT_TOKEN_HEADER: &str = "X-MS-TOKEN-AAD-ACCESS-TOKEN";

/// Header carrying the signed-in principal's name.
pub const DEFAULT_PRINCIPAL_NAME_HEADER: &str = "X-MS-CLIENT-PRINCIPAL-NAME";

/// Header carrying the signed-in principal's object id.
pub const DEFAULT_PRINCIPAL_ID_HEADER: &str = "X-MS-CLIENT-PRINCIPAL-ID";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteDriveConfig {
    /// Identity provider / application registration.
    pub identity: Option<IdentityConfig>,

    /// Graph API settings.
    pub graph: Option<GraphConfig>,

    /// Default site selection.
    pub site: Option<SiteConfig>,

    /// Managed-platform authentication signals.
    pub platform: Option<PlatformConfig>,
}

impl SiteDriveConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections present in both are merged field by field, so a layer that
    /// sets one key keeps the others from earlier layers.
    pub fn merge(&mut self, other: SiteDriveConfig) {
        merge_section(&mut self.identity, other.identity, IdentityConfig::merge);
        merge_section(&mut self.graph, other.graph, GraphConfig::merge);
        merge_section(&mut self.site, other.site, SiteConfig::merge);
        merge_section(&mut self.platform, other.platform, PlatformConfig::merge);
    }

    /// Identity section, or defaults when absent.
    pub fn identity(&self) -> IdentityConfig {
        self.identity.clone().unwrap_or_default()
    }

    /// Graph section, or defaults when absent.
    pub fn graph(&self) -> GraphConfig {
        self.graph.clone().unwrap_or_default()
    }

    /// Platform section, or defaults when absent.
    pub fn platform(&self) -> PlatformConfig {
        self.platform.clone().unwrap_or_default()
    }

    /// The configured default site URL, if any.
    pub fn default_site(&self) -> Option<&str> {
        self.site.as_ref().and_then(|s| s.default_url.as_deref())
    }
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
    let Some(other) = other else {
        return;
    };
    match base {
        Some(existing) => merge(existing, other),
        None => *base = Some(other),
    }
}

fn overlay<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application registration used by the interactive and client-credential flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    /// Only needed for the client-credentials grant.
    pub client_secret: Option<String>,
    pub authority: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
}

impl IdentityConfig {
    fn merge(&mut self, other: IdentityConfig) {
        overlay(&mut self.client_id, other.client_id);
        overlay(&mut self.tenant_id, other.tenant_id);
        overlay(&mut self.client_secret, other.client_secret);
        overlay(&mut self.authority, other.authority);
        overlay(&mut self.redirect_uri, other.redirect_uri);
        if !other.scopes.is_empty() {
            self.scopes = other.scopes;
        }
    }

    /// Client id, or an error naming the missing field.
    pub fn require_client_id(&self) -> Result<&str> {
        require(self.client_id.as_deref(), "client_id")
    }

    /// Tenant id, or an error naming the missing field.
    pub fn require_tenant_id(&self) -> Result<&str> {
        require(self.tenant_id.as_deref(), "tenant_id")
    }

    /// Authority base URL (without the tenant segment).
    pub fn authority(&self) -> &str {
        self.authority.as_deref().unwrap_or(DEFAULT_AUTHORITY)
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// Requested scopes; falls back to the Graph `.default` scope.
    pub fn scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            vec![GRAPH_DEFAULT_SCOPE.to_string()]
        } else {
            self.scopes.clone()
        }
    }

    /// Whether a client secret is available for app-only tokens.
    pub fn has_client_secret(&self) -> bool {
        self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
            context: "[identity] (or the matching environment variable)".to_string(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Graph API client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraphConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Maximum number of continuation pages to follow per listing.
    pub max_pages: Option<usize>,
    /// Memoize site handles within one process.
    pub cache_sites: Option<bool>,
}

impl GraphConfig {
    fn merge(&mut self, other: GraphConfig) {
        overlay(&mut self.endpoint, other.endpoint);
        overlay(&mut self.timeout_secs, other.timeout_secs);
        overlay(&mut self.max_pages, other.max_pages);
        overlay(&mut self.cache_sites, other.cache_sites);
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_GRAPH_ENDPOINT)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages.unwrap_or(DEFAULT_MAX_PAGES)
    }

    pub fn cache_sites(&self) -> bool {
        self.cache_sites.unwrap_or(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Site
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    /// e.g. `https://contoso.sharepoint.com/sites/demo`
    pub default_url: Option<String>,
}

impl SiteConfig {
    fn merge(&mut self, other: SiteConfig) {
        overlay(&mut self.default_url, other.default_url);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform
// ─────────────────────────────────────────────────────────────────────────────

/// Signals from a hosting platform that authenticates users on our behalf.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlatformConfig {
    /// The platform claims it handles authentication and injects tokens.
    pub auth_enabled: bool,
    pub token_header: Option<String>,
    pub principal_name_header: Option<String>,
    pub principal_id_header: Option<String>,
    /// Pre-issued token delivered through the environment instead of a header.
    #[serde(skip_serializing)]
    pub injected_token: Option<String>,
}

impl PlatformConfig {
    // `auth_enabled` has no unset state in a file, so any layer can enable it.
    fn merge(&mut self, other: PlatformConfig) {
        self.auth_enabled |= other.auth_enabled;
        overlay(&mut self.token_header, other.token_header);
        overlay(&mut self.principal_name_header, other.principal_name_header);
        overlay(&mut self.principal_id_header, other.principal_id_header);
        overlay(&mut self.injected_token, other.injected_token);
    }

    pub fn token_header(&self) -> &str {
        self.token_header.as_deref().unwrap_or(DEFAULT_TOKEN_HEADER)
    }

    pub fn principal_name_header(&self) -> &str {
        self.principal_name_header
            .as_deref()
            .unwrap_or(DEFAULT_PRINCIPAL_NAME_HEADER)
    }

    pub fn principal_id_header(&self) -> &str {
        self.principal_id_header
            .as_deref()
            .unwrap_or(DEFAULT_PRINCIPAL_ID_HEADER)
    }
}
