//! OAuth2 authorization code flow against Inoreader
//!
//! This module implements the three-legged flow used to obtain and maintain
//! the bridge's access token:
//!
//! 1. Generate a random `state` nonce and build the authorization URL.
//! 2. The user authorizes in a browser and pastes back the redirect URL.
//! 3. Validate the echoed `state` and extract the authorization `code`.
//! 4. Exchange the code at the token endpoint for a [`TokenRecord`].
//! 5. Later, trade the refresh token for a new record before expiry.
//!
//! [`AuthorizationAttempt`] tracks one pass through steps 1 to 4 and refuses
//! to exchange a code whose `state` does not match the one it issued.

use base64::Engine as _;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::auth::token_store::TokenRecord;
use crate::config::Config;
use crate::error::{InoreaderMcpError, Result};

/// Scope requested for every authorization.
pub const DEFAULT_SCOPE: &str = "read write";

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

// ---------------------------------------------------------------------------
// Token endpoint response
// ---------------------------------------------------------------------------

/// Raw token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    /// Converts the response into a [`TokenRecord`] issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Auth`] when the response carries no
    /// refresh token.
    pub(crate) fn into_record(self, issued_at: i64) -> Result<TokenRecord> {
        let refresh_token = self.refresh_token.ok_or_else(|| {
            InoreaderMcpError::Auth("token endpoint response did not include a refresh_token".into())
        })?;

        Ok(TokenRecord {
            access_token: self.access_token,
            refresh_token,
            expires_at: issued_at + self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS),
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// OAuthFlow
// ---------------------------------------------------------------------------

/// Client for the Inoreader OAuth2 endpoints.
///
/// Holds the application credentials and endpoint URLs plus an HTTP client
/// that lives as long as the flow value does.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::auth::flow::OAuthFlow;
///
/// let flow = OAuthFlow::new(
///     "1000000001",
///     "app-secret",
///     "https://www.inoreader.com/oauth2/auth",
///     "https://www.inoreader.com/oauth2/token",
/// );
/// let url = flow
///     .build_authorization_url("abc123", "http://localhost:8080/callback")
///     .unwrap();
/// assert!(url.as_str().contains("response_type=code"));
/// ```
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
}

impl OAuthFlow {
    /// Creates a flow for the given application and endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            client_id,
            client_secret,
            auth_url,
            token_url,
        )
    }

    /// Creates a flow that sends token requests through `http`.
    pub fn with_client(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
        }
    }

    /// Builds a flow from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if credentials are missing or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_seconds))
            .build()
            .map_err(|e| InoreaderMcpError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(
            http,
            config.app_id()?,
            config.app_key()?,
            config.inoreader.oauth_auth_url.clone(),
            config.inoreader.oauth_token_url.clone(),
        ))
    }

    /// Builds the authorization endpoint URL for one attempt.
    ///
    /// Pure: the same inputs always produce the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Config`] if the configured authorization
    /// endpoint is not a valid URL.
    pub fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<Url> {
        let mut url = Url::parse(&self.auth_url).map_err(|e| {
            InoreaderMcpError::Config(format!("invalid authorization endpoint URL: {e}"))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", DEFAULT_SCOPE)
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchanges an authorization code for a token record.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Auth`] when the endpoint answers with a
    /// non-success status (message carries the status and body verbatim) or
    /// when the response cannot be parsed.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenRecord> {
        tracing::info!(code = %redact(code), "Exchanging authorization code for tokens");

        let params = [
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
        ];

        self.request_tokens(&params, "Token exchange").await
    }

    /// Trades a refresh token for a new token record.
    ///
    /// The returned record carries whatever refresh token the server sent,
    /// rotated or not; callers must persist it.
    ///
    /// # Errors
    ///
    /// Same as [`exchange_code`](Self::exchange_code).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord> {
        tracing::info!("Refreshing access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        self.request_tokens(&params, "Token refresh").await
    }

    async fn request_tokens(&self, params: &[(&str, &str)], action: &str) -> Result<TokenRecord> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| InoreaderMcpError::Auth(format!("{action} request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "{} failed", action);
            return Err(InoreaderMcpError::Auth(format!(
                "{action} failed: {} - {body}",
                status.as_u16()
            ))
            .into());
        }

        let issued_at = Utc::now().timestamp();
        let raw: TokenResponse = resp
            .json()
            .await
            .map_err(|e| InoreaderMcpError::Auth(format!("failed to parse token response: {e}")))?;

        raw.into_record(issued_at)
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Returns `true` iff `now >= record.expires_at - buffer_seconds`.
pub fn is_expired(record: &TokenRecord, buffer_seconds: i64) -> bool {
    record.is_expired_with_buffer(buffer_seconds)
}

/// Generates a fresh CSRF nonce: 32 random bytes, base64url without padding.
pub fn generate_state() -> String {
    use rand::RngCore as _;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the `code` query parameter from a pasted redirect URL.
pub fn extract_code(redirect_url: &str) -> Option<String> {
    query_value(redirect_url, "code")
}

/// Extracts the `state` query parameter from a pasted redirect URL.
pub fn extract_state(redirect_url: &str) -> Option<String> {
    query_value(redirect_url, "state")
}

/// First value of `key` in the URL's query; malformed input yields `None`.
fn query_value(raw_url: &str, key: &str) -> Option<String> {
    let url = Url::parse(raw_url.trim()).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Shortens a secret for log output.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}***")
}

// ---------------------------------------------------------------------------
// AuthorizationAttempt
// ---------------------------------------------------------------------------

/// Progress of one authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No URL issued yet.
    Unstarted,
    /// URL issued; waiting for the user to paste the redirect URL.
    AwaitingUserRedirect,
    /// `state` validated and `code` extracted; exchange pending.
    CodeReceived,
    /// Exchange succeeded.
    TokensIssued,
}

/// One pass through the authorization code flow.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::auth::flow::{AttemptPhase, AuthorizationAttempt};
///
/// let mut attempt = AuthorizationAttempt::resume("expected", "http://localhost:8080/callback");
/// let err = attempt
///     .receive_redirect("http://localhost:8080/callback?code=c&state=forged")
///     .unwrap_err();
/// assert!(err.to_string().contains("mismatch"));
/// assert_eq!(attempt.phase(), AttemptPhase::AwaitingUserRedirect);
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationAttempt {
    phase: AttemptPhase,
    redirect_uri: String,
    state: Option<String>,
    code: Option<String>,
}

impl AuthorizationAttempt {
    /// A fresh attempt that has not issued a URL.
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            phase: AttemptPhase::Unstarted,
            redirect_uri: redirect_uri.into(),
            state: None,
            code: None,
        }
    }

    /// Rebuilds an attempt whose URL was issued earlier with `state`.
    pub fn resume(state: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            phase: AttemptPhase::AwaitingUserRedirect,
            redirect_uri: redirect_uri.into(),
            state: Some(state.into()),
            code: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    /// The nonce issued for this attempt, if any.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Generates a nonce and returns the authorization URL to open.
    ///
    /// Calling this again restarts the attempt with a new nonce.
    pub fn start(&mut self, flow: &OAuthFlow) -> Result<Url> {
        let state = generate_state();
        let url = flow.build_authorization_url(&state, &self.redirect_uri)?;
        self.state = Some(state);
        self.code = None;
        self.phase = AttemptPhase::AwaitingUserRedirect;
        Ok(url)
    }

    /// Validates the pasted redirect URL and captures the code.
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::CsrfMismatch`] when the echoed `state`
    /// differs from the issued one (the phase does not change), and
    /// [`InoreaderMcpError::Auth`] when the attempt is not awaiting a
    /// redirect or the URL carries no code.
    pub fn receive_redirect(&mut self, redirect_url: &str) -> Result<()> {
        if self.phase != AttemptPhase::AwaitingUserRedirect {
            return Err(InoreaderMcpError::Auth(format!(
                "cannot accept a redirect in phase {:?}",
                self.phase
            ))
            .into());
        }

        let expected = self.state.as_deref().unwrap_or_default();
        match extract_state(redirect_url) {
            Some(received) if !expected.is_empty() && received == expected => {}
            _ => {
                tracing::warn!("OAuth state mismatch in redirect URL");
                return Err(InoreaderMcpError::CsrfMismatch.into());
            }
        }

        let code = extract_code(redirect_url).ok_or_else(|| {
            InoreaderMcpError::Auth("authorization code missing from redirect URL".to_string())
        })?;

        self.code = Some(code);
        self.phase = AttemptPhase::CodeReceived;
        Ok(())
    }

    /// Exchanges the captured code for tokens.
    ///
    /// On failure the attempt stays in [`AttemptPhase::CodeReceived`].
    pub async fn complete(&mut self, flow: &OAuthFlow) -> Result<TokenRecord> {
        let code = match (self.phase, self.code.as_deref()) {
            (AttemptPhase::CodeReceived, Some(code)) => code,
            _ => {
                return Err(InoreaderMcpError::Auth(format!(
                    "no authorization code to exchange in phase {:?}",
                    self.phase
                ))
                .into())
            }
        };

        let record = flow.exchange_code(code, &self.redirect_uri).await?;
        self.state = None;
        self.code = None;
        self.phase = AttemptPhase::TokensIssued;
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> OAuthFlow {
        OAuthFlow::new(
            "test_client",
            "test_secret",
            "https://www.inoreader.com/oauth2/auth",
            "https://www.inoreader.com/oauth2/token",
        )
    }

    #[test]
    fn test_build_authorization_url_contains_required_params() {
        let url = flow()
            .build_authorization_url("abc123", "http://localhost:8080/callback")
            .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("client_id"), Some("test_client"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("scope"), Some("read write"));
        assert_eq!(get("state"), Some("abc123"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8080/callback"));
        assert!(url.as_str().starts_with("https://www.inoreader.com/oauth2/auth?"));
    }

    #[test]
    fn test_build_authorization_url_is_deterministic() {
        let a = flow().build_authorization_url("s", "http://localhost/cb").unwrap();
        let b = flow().build_authorization_url("s", "http://localhost/cb").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_authorization_url_rejects_bad_endpoint() {
        let flow = OAuthFlow::new("id", "secret", "not a url", "also not");
        assert!(flow.build_authorization_url("s", "http://x").is_err());
    }

    #[test]
    fn test_extract_code_and_state() {
        let url = "http://localhost:8080/callback?code=the%20code&state=xyz789";
        assert_eq!(extract_code(url).as_deref(), Some("the code"));
        assert_eq!(extract_state(url).as_deref(), Some("xyz789"));
    }

    #[test]
    fn test_extract_returns_first_value() {
        let url = "http://localhost/cb?state=first&state=second";
        assert_eq!(extract_state(url).as_deref(), Some("first"));
    }

    #[test]
    fn test_extract_missing_or_malformed_yields_none() {
        assert!(extract_code("http://localhost/cb?state=only").is_none());
        assert!(extract_code("definitely not a url").is_none());
        assert!(extract_state("").is_none());
    }

    #[test]
    fn test_generate_state_is_unique_and_urlsafe() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_response_defaults_lifetime_and_scope() {
        let raw = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_in: None,
            scope: None,
        };
        let record = raw.into_record(1_000).unwrap();
        assert_eq!(record.expires_at, 1_000 + DEFAULT_TOKEN_LIFETIME_SECONDS);
        assert_eq!(record.scope, "read write");
    }

    #[test]
    fn test_token_response_uses_declared_lifetime() {
        let raw = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_in: Some(86_400),
            scope: Some("read".to_string()),
        };
        let record = raw.into_record(1_000).unwrap();
        assert_eq!(record.expires_at, 87_400);
        assert_eq!(record.scope, "read");
    }

    #[test]
    fn test_token_response_without_refresh_token_fails() {
        let raw = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_in: Some(10),
            scope: None,
        };
        assert!(raw.into_record(0).is_err());
    }

    #[test]
    fn test_redact_keeps_prefix_only() {
        assert_eq!(redact("abcdefghijkl"), "abcd***");
        assert_eq!(redact("ab"), "ab***");
    }

    #[test]
    fn test_is_expired_property_over_lifetimes() {
        let now = Utc::now().timestamp();
        for n in [-10_i64, 0, 1, 299, 300] {
            let record = TokenRecord {
                access_token: "a".into(),
                refresh_token: "r".into(),
                expires_at: now + n,
                scope: DEFAULT_SCOPE.into(),
            };
            assert!(is_expired(&record, 300), "N={n} should be expired");
        }
        for n in [302_i64, 600, 3600] {
            let record = TokenRecord {
                access_token: "a".into(),
                refresh_token: "r".into(),
                expires_at: now + n,
                scope: DEFAULT_SCOPE.into(),
            };
            assert!(!is_expired(&record, 300), "N={n} should be valid");
        }
    }

    #[test]
    fn test_attempt_start_moves_to_awaiting() {
        let mut attempt = AuthorizationAttempt::new("http://localhost:8080/callback");
        assert_eq!(attempt.phase(), AttemptPhase::Unstarted);

        let url = attempt.start(&flow()).unwrap();
        let state = attempt.state().unwrap().to_string();

        assert_eq!(attempt.phase(), AttemptPhase::AwaitingUserRedirect);
        assert_eq!(extract_state(url.as_str()), Some(state));
    }

    #[test]
    fn test_attempt_accepts_matching_state() {
        let mut attempt = AuthorizationAttempt::resume("s1", "http://localhost:8080/callback");
        attempt
            .receive_redirect("http://localhost:8080/callback?code=c1&state=s1")
            .unwrap();
        assert_eq!(attempt.phase(), AttemptPhase::CodeReceived);
    }

    #[test]
    fn test_attempt_rejects_mismatched_state() {
        let mut attempt = AuthorizationAttempt::resume("s1", "http://localhost:8080/callback");
        let err = attempt
            .receive_redirect("http://localhost:8080/callback?code=c1&state=s2")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InoreaderMcpError>(),
            Some(InoreaderMcpError::CsrfMismatch)
        ));
        assert_eq!(attempt.phase(), AttemptPhase::AwaitingUserRedirect);
    }

    #[test]
    fn test_attempt_rejects_missing_state() {
        let mut attempt = AuthorizationAttempt::resume("s1", "http://localhost:8080/callback");
        let err = attempt
            .receive_redirect("http://localhost:8080/callback?code=c1")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InoreaderMcpError>(),
            Some(InoreaderMcpError::CsrfMismatch)
        ));
    }

    #[test]
    fn test_attempt_requires_code() {
        let mut attempt = AuthorizationAttempt::resume("s1", "http://localhost:8080/callback");
        let err = attempt
            .receive_redirect("http://localhost:8080/callback?state=s1")
            .unwrap_err();
        assert!(err.to_string().contains("code missing"));
        assert_eq!(attempt.phase(), AttemptPhase::AwaitingUserRedirect);
    }

    #[test]
    fn test_attempt_unstarted_rejects_redirect() {
        let mut attempt = AuthorizationAttempt::new("http://localhost:8080/callback");
        assert!(attempt
            .receive_redirect("http://localhost:8080/callback?code=c&state=s")
            .is_err());
    }

    #[tokio::test]
    async fn test_complete_without_code_fails() {
        let mut attempt = AuthorizationAttempt::new("http://localhost:8080/callback");
        assert!(attempt.complete(&flow()).await.is_err());
        assert_eq!(attempt.phase(), AttemptPhase::Unstarted);
    }
}
