//! API endpoint implementations.

mod drive;
mod sites;

pub use drive::DriveApi;
pub use sites::SitesApi;
