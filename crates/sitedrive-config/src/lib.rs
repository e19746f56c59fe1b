//! Configuration system for sitedrive.
//!
//! Provides TOML-based configuration with:
//! - Identity provider settings (`[identity]`)
//! - Graph API endpoint and paging limits (`[graph]`)
//! - A default site (`[site]`)
//! - Managed-platform authentication signals (`[platform]`)
//!
//! Layers are merged in order: user config, project-local `sitedrive.toml`,
//! then the process environment (see [`env`]).

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
