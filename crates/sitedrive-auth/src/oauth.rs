//! OAuth 2.0 flows against the Microsoft identity platform.
//!
//! Authorization code + PKCE for interactive sign-in, refresh-token grant for
//! silent reuse, and the client-credentials grant for app-only tokens.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};
use crate::session::{AccessToken, Account};

/// Default authority; the tenant id is appended.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";

/// Default redirect URI for public-client apps.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Graph scope covering every permission granted to the app.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Added to interactive requests so we get an ID token and a refresh token.
const OIDC_SCOPES: &str = "openid profile offline_access";

/// Upper bound on `expires_in` we are willing to believe (one year).
const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Application registration and endpoints.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub client_secret: Option<String>,
    pub authority: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            client_secret: None,
            authority: DEFAULT_AUTHORITY.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![GRAPH_DEFAULT_SCOPE.to_string()],
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.scopes = scopes;
        }
        self
    }

    pub fn with_client_secret(mut self, secret: Option<String>) -> Self {
        self.client_secret = secret.filter(|s| !s.is_empty());
        self
    }

    /// `{authority}/{tenant}`
    pub fn authority_url(&self) -> String {
        format!(
            "{}/{}",
            self.authority.trim_end_matches('/'),
            self.tenant_id.trim_matches('/')
        )
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority_url())
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority_url())
    }

    /// Resource scopes joined for the token endpoint.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Resource scopes plus the OpenID Connect scopes.
    pub fn interactive_scope(&self) -> String {
        format!("{} {}", self.scope(), OIDC_SCOPES)
    }
}

/// PKCE code verifier and challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair.
    pub fn generate() -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL for the interactive flow.
pub fn build_authorization_url(config: &OAuthConfig, challenge: &str, state: &str) -> String {
    let scope = config.interactive_scope();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_mode", "query"),
        ("scope", scope.as_str()),
        ("state", state),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
        ("prompt", "select_account"),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url(), query)
}

/// Authorization code returned on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

/// Parse what the browser was redirected to.
///
/// Accepts the full redirect URL or just its query string. An `error`
/// parameter is turned into the matching error.
pub fn parse_redirect(input: &str) -> Result<AuthorizationResponse> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Cancelled("no redirect URL provided".to_string()));
    }

    let query = match url::Url::parse(trimmed) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => trimmed.trim_start_matches('?').to_string(),
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let description = description.unwrap_or_default();
        if error == "access_denied" {
            return Err(AuthError::Cancelled(description));
        }
        return Err(AuthError::Provider { error, description });
    }

    match (code, state) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
            Ok(AuthorizationResponse { code, state })
        }
        _ => Err(AuthError::InvalidRequest(
            "redirect is missing the code or state parameter".to_string(),
        )),
    }
}

/// Token endpoint success response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Convert to a token whose expiry is relative to `issued_at`.
    pub fn access_token_at(&self, issued_at: DateTime<Utc>) -> AccessToken {
        let mut token = AccessToken::new(self.access_token.clone());
        if self.expires_in > 0 {
            let secs = i64::try_from(self.expires_in)
                .unwrap_or(MAX_LIFETIME_SECS)
                .min(MAX_LIFETIME_SECS);
            token = token.with_expiry(issued_at + Duration::seconds(secs));
        }
        if let Some(scope) = &self.scope {
            token = token.with_scope(scope.clone());
        }
        token
    }

    pub fn access_token(&self) -> AccessToken {
        self.access_token_at(Utc::now())
    }

    /// Account described by the ID token, if one was returned and readable.
    pub fn account(&self) -> Option<Account> {
        let id_token = self.id_token.as_deref()?;
        match decode_id_token_claims(id_token) {
            Ok(claims) => Some(claims.into_account()),
            Err(e) => {
                tracing::warn!("could not read ID token claims: {}", e);
                None
            }
        }
    }
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// The ID token claims we display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

impl IdTokenClaims {
    pub fn into_account(self) -> Account {
        let display_name = self
            .name
            .or(self.preferred_username)
            .unwrap_or_else(|| "User".to_string());
        let account_id = self.oid.or(self.sub).unwrap_or_default();
        Account::new(display_name, account_id)
    }
}

/// Read the payload of a JWT without verifying it.
///
/// The token came straight from the token endpoint over TLS and is only used
/// for display.
pub fn decode_id_token_claims(id_token: &str) -> Result<IdTokenClaims> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::InvalidResponse("ID token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidResponse(format!("ID token payload: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidResponse(format!("ID token claims: {}", e)))
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code_for_tokens(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let scope = config.interactive_scope();
    let form = [
        ("client_id", config.client_id.as_str()),
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("code_verifier", verifier),
        ("scope", scope.as_str()),
    ];
    post_token_request(http, &config.token_url(), &form, "Token exchange").await
}

/// Refresh an access token using a refresh token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &OAuthConfig,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let scope = config.interactive_scope();
    let form = [
        ("client_id", config.client_id.as_str()),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("scope", scope.as_str()),
    ];
    post_token_request(http, &config.token_url(), &form, "Token refresh").await
}

/// Acquire an app-only token with the client secret.
pub async fn acquire_client_credentials(
    http: &reqwest::Client,
    config: &OAuthConfig,
) -> Result<TokenResponse> {
    let secret = config.client_secret.as_deref().ok_or_else(|| {
        AuthError::Misconfigured("client credentials require CLIENT_SECRET".to_string())
    })?;
    let scope = config.scope();
    let form = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", secret),
        ("grant_type", "client_credentials"),
        ("scope", scope.as_str()),
    ];
    post_token_request(http, &config.token_url(), &form, "Client credentials").await
}

async fn post_token_request(
    http: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
    what: &str,
) -> Result<TokenResponse> {
    tracing::debug!(url = token_url, "{} request", what);
    let response = http
        .post(token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("{} request failed: {}", what, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => AuthError::Provider {
                error: err.error,
                description: err.error_description,
            },
            Err(_) => AuthError::Provider {
                error: format!("http_{}", status.as_u16()),
                description: format!("{} failed: {}", what, body),
            },
        });
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse {} response: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig::new("client-123", "contoso.onmicrosoft.com")
    }

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::generate();
        assert!(!pkce.verifier.is_empty());
        assert!(!pkce.challenge.is_empty());
        assert_ne!(pkce.verifier, pkce.challenge);
    }

    #[test]
    fn test_state_generation() {
        let state1 = generate_state();
        let state2 = generate_state();
        assert!(!state1.is_empty());
        assert_ne!(state1, state2);
    }

    #[test]
    fn test_endpoints() {
        let config = config().with_authority("https://login.example.test");
        assert_eq!(
            config.authority_url(),
            "https://login.example.test/contoso.onmicrosoft.com"
        );
        assert_eq!(
            config.token_url(),
            "https://login.example.test/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );

        assert_eq!(
            self::config().authorize_url(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/authorize"
        );
    }

    #[test]
    fn test_authorization_url() {
        let url = build_authorization_url(&config(), "test_challenge", "test_state");

        assert!(url.starts_with(
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/authorize?"
        ));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("code_challenge=test_challenge"));
        assert!(url.contains("state=test_state"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("prompt=select_account"));
        assert!(url.contains("offline_access"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost"));
    }

    #[test]
    fn test_scopes_fallback() {
        let config = config().with_scopes(Vec::new());
        assert_eq!(config.scope(), GRAPH_DEFAULT_SCOPE);
        let config = config.with_scopes(vec!["Sites.Read.All".to_string()]);
        assert_eq!(config.scope(), "Sites.Read.All");
    }

    #[test]
    fn test_parse_redirect_full_url() {
        let parsed = parse_redirect("http://localhost/?code=abc123&state=xyz789&session_state=s")
            .unwrap();
        assert_eq!(parsed.code, "abc123");
        assert_eq!(parsed.state, "xyz789");
    }

    #[test]
    fn test_parse_redirect_query_only() {
        let parsed = parse_redirect("  ?code=a%2Bb&state=st  ").unwrap();
        assert_eq!(parsed.code, "a+b");
        assert_eq!(parsed.state, "st");
    }

    #[test]
    fn test_parse_redirect_errors() {
        assert!(matches!(
            parse_redirect(""),
            Err(AuthError::Cancelled(_))
        ));
        assert!(matches!(
            parse_redirect("http://localhost/?error=access_denied&error_description=nope"),
            Err(AuthError::Cancelled(_))
        ));
        assert!(matches!(
            parse_redirect("http://localhost/?error=invalid_client"),
            Err(AuthError::Provider { .. })
        ));
        assert!(matches!(
            parse_redirect("http://localhost/?code=abc"),
            Err(AuthError::InvalidRequest(_))
        ));
    }

    fn id_token(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_decode_id_token_claims() {
        let token = id_token(r#"{"name":"Ada Lovelace","oid":"oid-1","preferred_username":"ada@contoso.com"}"#);
        let account = decode_id_token_claims(&token).unwrap().into_account();
        assert_eq!(account.display_name, "Ada Lovelace");
        assert_eq!(account.account_id, "oid-1");
    }

    #[test]
    fn test_decode_id_token_fallbacks() {
        let token = id_token(r#"{"preferred_username":"ada@contoso.com","sub":"sub-1"}"#);
        let account = decode_id_token_claims(&token).unwrap().into_account();
        assert_eq!(account.display_name, "ada@contoso.com");
        assert_eq!(account.account_id, "sub-1");

        assert!(decode_id_token_claims("not-a-jwt").is_err());
    }

    #[test]
    fn test_token_response_conversion() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":3600,"scope":"Sites.Read.All","refresh_token":"rt"}"#,
        )
        .unwrap();
        let issued = Utc::now();
        let token = response.access_token_at(issued);
        assert_eq!(token.secret(), "at");
        assert_eq!(token.expires_at(), Some(issued + Duration::seconds(3600)));
        assert_eq!(token.scope(), Some("Sites.Read.All"));
        assert!(response.account().is_none());
    }
}
