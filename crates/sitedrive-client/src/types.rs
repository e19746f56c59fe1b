//! Site references and the records returned by the Graph drive endpoints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Sites
// ─────────────────────────────────────────────────────────────────────────────

/// A site named by tenant host and server-relative path, e.g.
/// `https://contoso.sharepoint.com/sites/demo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteReference {
    host: String,
    /// Empty for the tenant root site, otherwise starts with `/`.
    path: String,
}

impl SiteReference {
    /// Parse a site URL. The scheme is optional.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSiteReference("site URL is empty".to_string()));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| Error::InvalidSiteReference(format!("{}: {}", trimmed, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidSiteReference(format!(
                "{}: unsupported scheme {}",
                trimmed,
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidSiteReference(format!("{}: no host", trimmed)))?;

        Ok(Self {
            host: host.to_string(),
            path: url.path().trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Relative Graph path that resolves this site.
    pub(crate) fn graph_path(&self) -> String {
        if self.path.is_empty() {
            format!("sites/{}", self.host)
        } else {
            format!("sites/{}:{}", self.host, self.path)
        }
    }
}

impl FromStr for SiteReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SiteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://{}{}", self.host, self.path)
    }
}

/// The service's identifier for a resolved site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteHandle(String);

impl SiteHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Site descriptor as returned by `GET /sites/{host}:{path}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Drive items
// ─────────────────────────────────────────────────────────────────────────────

/// A file or folder in a document library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    /// Bytes; 0 when the service did not report a size.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    pub is_folder: bool,
}

/// Raw `driveItem` record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    last_modified_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    web_url: Option<String>,
    /// Present (even as `{}`) only on folders.
    #[serde(default)]
    folder: Option<serde_json::Value>,
}

impl DriveItem {
    pub(crate) fn into_entry(self, url: &Url) -> Result<DirectoryEntry> {
        let id = self.id.ok_or_else(|| Error::MissingField {
            field: "id",
            url: url.to_string(),
        })?;
        let name = self.name.ok_or_else(|| Error::MissingField {
            field: "name",
            url: url.to_string(),
        })?;
        Ok(DirectoryEntry {
            id,
            name,
            size: self.size.unwrap_or(0),
            last_modified: self.last_modified_date_time,
            web_url: self.web_url,
            is_folder: self.folder.is_some(),
        })
    }
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default, rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}
