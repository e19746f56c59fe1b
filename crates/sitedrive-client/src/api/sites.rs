//! Sites API.

use crate::client::GraphClient;
use crate::error::{Error, Result};
use crate::types::{SiteDescriptor, SiteHandle, SiteReference};

/// Sites API client.
pub struct SitesApi {
    client: GraphClient,
}

impl SitesApi {
    pub(crate) fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Resolve a site URL to the service's site id.
    ///
    /// When memoization is on, the lock is held across the request so
    /// concurrent callers share one lookup.
    pub async fn resolve(&self, site: &SiteReference) -> Result<SiteHandle> {
        let Some(memo) = &self.client.inner().sites else {
            return self.fetch(site).await;
        };

        let mut sites = memo.lock().await;
        if let Some(handle) = sites.get(site) {
            tracing::debug!(site = %site, "site handle from cache");
            return Ok(handle.clone());
        }

        let handle = self.fetch(site).await?;
        sites.insert(site.clone(), handle.clone());
        Ok(handle)
    }

    async fn fetch(&self, site: &SiteReference) -> Result<SiteHandle> {
        let url = self.client.url(&site.graph_path())?;
        let descriptor: SiteDescriptor = self.client.get_json(&url).await?;

        let id = descriptor
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MissingField {
                field: "id",
                url: url.to_string(),
            })?;

        tracing::debug!(
            site = %site,
            id = %id,
            name = descriptor.display_name.as_deref().unwrap_or(""),
            "resolved site"
        );
        Ok(SiteHandle::new(id))
    }
}
