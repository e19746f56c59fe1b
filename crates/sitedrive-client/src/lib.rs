//! Typed Microsoft Graph client for SharePoint document libraries.
//!
//! Resolves a site URL to the service's site id, then lists, searches and
//! downloads items in the site's default document library. The client only
//! needs a bearer token; acquiring one is the caller's business.
//!
//! # Example
//!
//! ```no_run
//! use sitedrive_client::{GraphClient, Result, SiteReference};
//!
//! # async fn example() -> Result<()> {
//! let client = GraphClient::builder()
//!     .access_token("eyJ0...")
//!     .max_pages(10)
//!     .build()?;
//!
//! let site = SiteReference::parse("https://contoso.sharepoint.com/sites/demo")?;
//! let hits = client.drive().search(&site, "budget").await?;
//! println!("{} matches", hits.len());
//!
//! let bytes = client.drive().content(&site, "Shared Documents/budget.xlsx").await?;
//! println!("{} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Sites**: resolve a site URL to its id (memoized per client)
//! - **Drive**: list root or folder children, search, download content

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::{DriveApi, SitesApi};
pub use client::{ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, GraphClient};
pub use error::{Error, Result};
pub use types::{DirectoryEntry, SiteHandle, SiteReference};
