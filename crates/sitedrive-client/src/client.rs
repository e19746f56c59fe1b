//! Main client implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use url::Url;

use crate::api::{DriveApi, SitesApi};
use crate::error::{Error, ErrorResponse, Result};
use crate::types::{Page, SiteHandle, SiteReference};

/// Default Graph API base.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for content downloads.
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Default cap on `@odata.nextLink` pages followed per collection.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Microsoft Graph client scoped to one bearer token.
///
/// # Example
///
/// ```no_run
/// use sitedrive_client::{GraphClient, SiteReference};
///
/// # async fn example() -> sitedrive_client::Result<()> {
/// let client = GraphClient::builder().access_token("eyJ0...").build()?;
/// let site = SiteReference::parse("https://contoso.sharepoint.com/sites/demo")?;
///
/// for entry in client.drive().list(&site, Some("Shared Documents")).await? {
///     println!("{}", entry.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests, always ending in `/`.
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Content download timeout.
    pub(crate) download_timeout: Duration,
    /// Pages followed per collection.
    pub(crate) max_pages: usize,
    /// Resolved sites; `None` when memoization is disabled.
    pub(crate) sites: Option<Mutex<HashMap<SiteReference, SiteHandle>>>,
}

impl GraphClient {
    /// Get access to the inner client state (for API implementations).
    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("max_pages", &self.inner.max_pages)
            .field("cache_sites", &self.inner.sites.is_some())
            .finish()
    }
}

impl GraphClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the sites API.
    pub fn sites(&self) -> SitesApi {
        SitesApi::new(self.clone())
    }

    /// Access the document library API.
    pub fn drive(&self) -> DriveApi {
        DriveApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Site memo
    // ─────────────────────────────────────────────────────────────────────────

    /// Forget the resolved handle for one site.
    pub async fn invalidate_site(&self, site: &SiteReference) {
        if let Some(sites) = &self.inner.sites {
            sites.lock().await.remove(site);
        }
    }

    /// Forget every resolved site.
    pub async fn clear_site_cache(&self) {
        if let Some(sites) = &self.inner.sites {
            sites.lock().await.clear();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Make a GET request and decode the JSON body.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .inner
            .http
            .get(url.clone())
            .timeout(self.inner.timeout)
            .send()
            .await?;
        self.handle_response(response, url).await
    }

    /// GET a collection, following `@odata.nextLink` up to the page limit.
    pub(crate) async fn get_paged<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.clone());
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages == self.inner.max_pages {
                tracing::warn!(
                    url = %url,
                    max_pages = self.inner.max_pages,
                    "page limit reached; returning partial results"
                );
                break;
            }
            let page: Page<T> = self.get_json(&page_url).await?;
            pages += 1;
            items.extend(page.value);
            next = match page.next_link {
                Some(link) => self.same_origin(Url::parse(&link)?),
                None => None,
            };
        }

        Ok(items)
    }

    /// Continuation links only go back to the API host; the bearer token
    /// travels with every request.
    fn same_origin(&self, link: Url) -> Option<Url> {
        if link.origin() == self.inner.base_url.origin() {
            Some(link)
        } else {
            tracing::warn!(
                next_link = %link,
                "continuation link points outside the API host; not following"
            );
            None
        }
    }

    /// GET raw bytes, following redirects to the download location.
    pub(crate) async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::debug!(url = %url, "GET content");
        let response = self
            .inner
            .http
            .get(url.clone())
            .timeout(self.inner.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.extract_error(response, url).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        url: &Url,
    ) -> Result<T> {
        if response.status().is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            Err(self.extract_error(response, url).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response, url: &Url) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error.message)
        {
            Some(message) => message,
            None if !body.trim().is_empty() => body,
            None => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
        };

        tracing::debug!(url = %url, status = status.as_u16(), "Graph request failed");
        Error::Remote {
            status: status.as_u16(),
            message,
            url: url.to_string(),
        }
    }
}

/// Builder for creating a GraphClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
    download_timeout: Duration,
    user_agent: Option<String>,
    max_pages: usize,
    cache_sites: bool,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            user_agent: None,
            max_pages: DEFAULT_MAX_PAGES,
            cache_sites: true,
        }
    }

    /// Override the Graph API base (default [`DEFAULT_BASE_URL`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the bearer token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the content download timeout.
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Cap on continuation pages per collection. At least one page is always
    /// fetched.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Remember resolved site handles (default on).
    pub fn cache_sites(mut self, enabled: bool) -> Self {
        self.cache_sites = enabled;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GraphClient> {
        let token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config("access_token is required".to_string()))?;

        // Parse and normalize base URL
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::Config("Invalid access token".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("sitedrive/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(GraphClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                download_timeout: self.download_timeout,
                max_pages: self.max_pages,
                sites: self.cache_sites.then(|| Mutex::new(HashMap::new())),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
