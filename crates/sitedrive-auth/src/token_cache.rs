//! Token cache for signed-in account sessions.
//!
//! Lets a later process reuse the account signed in by an earlier one without
//! prompting again. Losing the cache only forces a new sign-in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AuthError, Result};
use crate::session::{AccessToken, Account};

/// Default cache file name within the sitedrive config directory.
pub const TOKEN_CACHE_FILE: &str = "token-cache.json";

/// A previously signed-in account and its tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSession {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub account: Option<Account>,
    pub cached_at: DateTime<Utc>,
}

impl CachedSession {
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<String>,
        account: Option<Account>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            account,
            cached_at: Utc::now(),
        }
    }
}

// ============================================================================
// TokenCache Trait
// ============================================================================

/// Storage for the cached account session.
#[async_trait]
pub trait TokenCache: Send + Sync + std::fmt::Debug {
    /// Check if a session is stored.
    fn has_session(&self) -> bool;

    /// Load the stored session.
    async fn load(&self) -> Result<Option<CachedSession>>;

    /// Replace the stored session.
    async fn save(&self, session: &CachedSession) -> Result<()>;

    /// Remove the stored session.
    async fn clear(&self) -> Result<()>;
}

// ============================================================================
// FileTokenCache
// ============================================================================

/// JSON file cache.
#[derive(Debug)]
pub struct FileTokenCache {
    path: PathBuf,
    cached: RwLock<Option<CachedSession>>,
}

impl FileTokenCache {
    /// Cache file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(TOKEN_CACHE_FILE))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenCache for FileTokenCache {
    fn has_session(&self) -> bool {
        self.path.exists()
    }

    async fn load(&self) -> Result<Option<CachedSession>> {
        {
            let cache = self.cached.read().await;
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Cache(format!("Failed to read token cache: {}", e)))?;

        let session: CachedSession = serde_json::from_str(&content)
            .map_err(|e| AuthError::Cache(format!("Failed to parse token cache: {}", e)))?;

        let mut cache = self.cached.write().await;
        *cache = Some(session.clone());

        Ok(Some(session))
    }

    async fn save(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Cache(format!("Failed to create token cache directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| AuthError::Cache(format!("Failed to serialize token cache: {}", e)))?;

        std::fs::write(&self.path, json)
            .map_err(|e| AuthError::Cache(format!("Failed to write token cache: {}", e)))?;

        // Holds a refresh token: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    AuthError::Cache(format!("Failed to restrict token cache permissions: {}", e))
                })?;
        }

        let mut cache = self.cached.write().await;
        *cache = Some(session.clone());

        tracing::info!("Token cache saved to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| AuthError::Cache(format!("Failed to delete token cache: {}", e)))?;
        }
        let mut cache = self.cached.write().await;
        *cache = None;
        Ok(())
    }
}

// ============================================================================
// InMemoryTokenCache
// ============================================================================

/// Process-local cache; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    session: RwLock<Option<CachedSession>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: CachedSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    fn has_session(&self) -> bool {
        self.session
            .try_read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    async fn load(&self) -> Result<Option<CachedSession>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: &CachedSession) -> Result<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

// ============================================================================
// Shared Token Cache
// ============================================================================

/// Shared token cache for use across async contexts.
pub type SharedTokenCache = Arc<dyn TokenCache>;

/// Create a shared file-based token cache.
pub fn create_token_cache(data_dir: &Path) -> SharedTokenCache {
    Arc::new(FileTokenCache::new(data_dir))
}

/// Create a shared in-memory token cache.
pub fn create_memory_token_cache() -> SharedTokenCache {
    Arc::new(InMemoryTokenCache::new())
}
