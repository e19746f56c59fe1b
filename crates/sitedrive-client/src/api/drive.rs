//! Document library API: listing, search and content.

use url::Url;

use crate::client::GraphClient;
use crate::error::{Error, Result};
use crate::types::{DirectoryEntry, DriveItem, SiteHandle, SiteReference};

/// Document library API client.
pub struct DriveApi {
    client: GraphClient,
}

impl DriveApi {
    pub(crate) fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// List the children of the library root, or of `folder` within it.
    pub async fn list(
        &self,
        site: &SiteReference,
        folder: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        let folder = folder.map(encode_path).transpose()?;
        let handle = self.client.sites().resolve(site).await?;
        let url = self.client.url(&children_path(&handle, folder.as_deref()))?;
        self.entries(&url).await
    }

    /// Search the library by name and content.
    pub async fn search(&self, site: &SiteReference, query: &str) -> Result<Vec<DirectoryEntry>> {
        let handle = self.client.sites().resolve(site).await?;
        let url = self.client.url(&search_path(&handle, query))?;
        self.entries(&url).await
    }

    /// Download a file's bytes.
    pub async fn content(&self, site: &SiteReference, path: &str) -> Result<Vec<u8>> {
        let encoded = encode_path(path)?;
        if encoded.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let handle = self.client.sites().resolve(site).await?;
        let url = self
            .client
            .url(&format!("sites/{}/drive/root:/{}:/content", handle, encoded))?;
        self.client.get_bytes(&url).await
    }

    async fn entries(&self, url: &Url) -> Result<Vec<DirectoryEntry>> {
        let items: Vec<DriveItem> = self.client.get_paged(url).await?;
        items.into_iter().map(|item| item.into_entry(url)).collect()
    }
}

/// Percent-encode each segment of a drive path, keeping the separators.
///
/// `.` and `..` are rejected: URL resolution would collapse them and move the
/// request outside the library root.
pub(crate) fn encode_path(path: &str) -> Result<String> {
    let mut segments = Vec::new();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(Error::InvalidPath(path.to_string()));
        }
        segments.push(urlencoding::encode(segment).into_owned());
    }
    Ok(segments.join("/"))
}

/// `folder` is already encoded.
fn children_path(handle: &SiteHandle, folder: Option<&str>) -> String {
    match folder.filter(|p| !p.is_empty()) {
        Some(path) => format!("sites/{}/drive/root:/{}:/children", handle, path),
        None => format!("sites/{}/drive/root/children", handle),
    }
}

fn search_path(handle: &SiteHandle, query: &str) -> String {
    // OData string literals escape a quote by doubling it.
    let literal = query.replace('\'', "''");
    format!(
        "sites/{}/drive/root/search(q='{}')",
        handle,
        urlencoding::encode(&literal)
    )
}
