//! Tokens injected by a hosting platform that authenticates users itself.

use reqwest::header::HeaderMap;

use crate::error::{AuthError, Result};
use crate::session::{AccessToken, Account};

/// Where the platform puts the token and principal.
#[derive(Debug, Clone)]
pub struct ManagedConfig {
    /// The platform's "authentication enabled" flag.
    pub auth_enabled: bool,
    pub token_header: String,
    pub principal_name_header: String,
    pub principal_id_header: String,
    /// Token delivered through the environment, captured at startup.
    pub injected_token: Option<String>,
}

impl Default for ManagedConfig {
    fn default() -> Self {
        Self {
            auth_enabled: false,
            token_header: "X-MS-TOKEN-AAD-ACCESS-TOKEN".to_string(),
            principal_name_header: "X-MS-CLIENT-PRINCIPAL-NAME".to_string(),
            principal_id_header: "X-MS-CLIENT-PRINCIPAL-ID".to_string(),
            injected_token: None,
        }
    }
}

/// Reads the platform-injected token.
#[derive(Debug, Clone)]
pub struct ManagedTokenSource {
    config: ManagedConfig,
}

impl ManagedTokenSource {
    pub fn new(config: ManagedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ManagedConfig {
        &self.config
    }

    /// Token from the inbound header, else from the environment.
    ///
    /// Returns an error when the platform flag is set but neither source
    /// delivered a token: the deployment is misconfigured.
    pub fn acquire(&self, headers: &HeaderMap) -> Result<Option<AccessToken>> {
        if let Some(token) = header_value(headers, &self.config.token_header) {
            tracing::debug!(header = %self.config.token_header, "using platform-injected token");
            return Ok(Some(AccessToken::new(token)));
        }

        if let Some(token) = self.config.injected_token.as_deref().filter(|t| !t.is_empty()) {
            tracing::debug!("using platform token from environment");
            return Ok(Some(AccessToken::new(token)));
        }

        if self.config.auth_enabled {
            return Err(AuthError::Misconfigured(format!(
                "platform authentication is enabled but no token was injected. \
                 Check that the token store is enabled, that the app has the \
                 required API permissions, and that requests carry the {} header",
                self.config.token_header
            )));
        }

        Ok(None)
    }

    /// Principal the platform signed in, if it told us.
    pub fn account(&self, headers: &HeaderMap) -> Option<Account> {
        let name = header_value(headers, &self.config.principal_name_header);
        let id = header_value(headers, &self.config.principal_id_header);
        if name.is_none() && id.is_none() {
            return None;
        }
        Some(Account::new(
            name.unwrap_or("User"),
            id.unwrap_or_default(),
        ))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(v) if !v.trim().is_empty() => Some(v.trim()),
        Ok(_) => None,
        Err(_) => {
            tracing::warn!(header = name, "ignoring non-ASCII header value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_header_token_preferred() {
        let source = ManagedTokenSource::new(ManagedConfig {
            injected_token: Some("from-env".to_string()),
            ..Default::default()
        });
        let token = source
            .acquire(&headers(&[("x-ms-token-aad-access-token", "from-header")]))
            .unwrap()
            .unwrap();
        assert_eq!(token.secret(), "from-header");
    }

    #[test]
    fn test_env_token_fallback() {
        let source = ManagedTokenSource::new(ManagedConfig {
            injected_token: Some("from-env".to_string()),
            ..Default::default()
        });
        let token = source.acquire(&HeaderMap::new()).unwrap().unwrap();
        assert_eq!(token.secret(), "from-env");
    }

    #[test]
    fn test_missing_token_with_flag_is_misconfiguration() {
        let source = ManagedTokenSource::new(ManagedConfig {
            auth_enabled: true,
            ..Default::default()
        });
        let err = source.acquire(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::Misconfigured(_)));
        assert!(err.to_string().contains("X-MS-TOKEN-AAD-ACCESS-TOKEN"));
    }

    #[test]
    fn test_missing_token_without_flag_is_absent() {
        let source = ManagedTokenSource::new(ManagedConfig::default());
        assert!(source.acquire(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_blank_header_ignored() {
        let source = ManagedTokenSource::new(ManagedConfig::default());
        let result = source
            .acquire(&headers(&[("x-ms-token-aad-access-token", "  ")]))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_account_from_principal_headers() {
        let source = ManagedTokenSource::new(ManagedConfig::default());
        let account = source
            .account(&headers(&[
                ("x-ms-client-principal-name", "ada@contoso.com"),
                ("x-ms-client-principal-id", "oid-42"),
            ]))
            .unwrap();
        assert_eq!(account.display_name, "ada@contoso.com");
        assert_eq!(account.account_id, "oid-42");

        assert!(source.account(&HeaderMap::new()).is_none());
    }
}
