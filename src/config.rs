//! Configuration management for inoreader-mcp
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest: built-in defaults, the optional YAML file,
//! `INOREADER_*` environment variables, then command-line flags.

use crate::error::{InoreaderMcpError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the persisted token record
pub const TOKEN_FILE_NAME: &str = "tokens.json";

/// File name of the pending CSRF state written by `auth login`
pub const STATE_FILE_NAME: &str = "oauth_state.txt";

/// Main configuration structure for inoreader-mcp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inoreader application credentials and endpoints
    #[serde(default)]
    pub inoreader: InoreaderConfig,
    /// OAuth2 token handling
    #[serde(default)]
    pub auth: AuthConfig,
    /// Request layer behavior
    #[serde(default)]
    pub api: ApiConfig,
    /// Set when the retired username/password variables are present
    #[serde(skip)]
    legacy_credentials_present: bool,
}

/// Inoreader application registration and endpoint URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InoreaderConfig {
    /// Application ID from the Inoreader developer console
    #[serde(default)]
    pub app_id: Option<String>,

    /// Application key (client secret) from the Inoreader developer console
    #[serde(default)]
    pub app_key: Option<String>,

    /// Base URL of the reader API
    ///
    /// Overridable so tests can point the client at a mock server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 authorization endpoint
    #[serde(default = "default_oauth_auth_url")]
    pub oauth_auth_url: String,

    /// OAuth2 token endpoint
    #[serde(default = "default_oauth_token_url")]
    pub oauth_token_url: String,
}

fn default_base_url() -> String {
    "https://www.inoreader.com/reader/api/0".to_string()
}

fn default_oauth_auth_url() -> String {
    "https://www.inoreader.com/oauth2/auth".to_string()
}

fn default_oauth_token_url() -> String {
    "https://www.inoreader.com/oauth2/token".to_string()
}

impl Default for InoreaderConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: default_base_url(),
            oauth_auth_url: default_oauth_auth_url(),
            oauth_token_url: default_oauth_token_url(),
        }
    }
}

/// OAuth2 token handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Explicit token file location; the per-user config dir is used when unset
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Redirect URI registered for the application
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Seconds before `expires_at` at which a token is treated as expired
    #[serde(default = "default_expiry_buffer_seconds")]
    pub expiry_buffer_seconds: i64,
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/callback".to_string()
}

fn default_expiry_buffer_seconds() -> i64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: None,
            redirect_uri: default_redirect_uri(),
            expiry_buffer_seconds: default_expiry_buffer_seconds(),
        }
    }
}

/// Request layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Upper bound on `n` for stream listings and searches
    #[serde(default = "default_max_articles")]
    pub max_articles_per_request: usize,

    /// Number of article IDs sent per `edit-tag` call when marking read
    #[serde(default = "default_mark_read_chunk_size")]
    pub mark_read_chunk_size: usize,

    /// Number of recent reading-list items scanned by a search
    #[serde(default = "default_search_window")]
    pub search_window: usize,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_articles() -> usize {
    50
}

fn default_mark_read_chunk_size() -> usize {
    20
}

fn default_search_window() -> usize {
    200
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            max_articles_per_request: default_max_articles(),
            mark_read_chunk_size: default_mark_read_chunk_size(),
            search_window: default_search_window(),
        }
    }
}

impl Config {
    /// Load configuration with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to a YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = match path {
            Some(path) if Path::new(path).exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!("Config file not found at {}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InoreaderMcpError::Config(format!("Failed to read config file: {}", e))
        })?;
        serde_yaml::from_str(&contents)
            .map_err(|e| InoreaderMcpError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(app_id) = std::env::var("INOREADER_APP_ID") {
            self.inoreader.app_id = Some(app_id);
        }

        if let Ok(app_key) = std::env::var("INOREADER_APP_KEY") {
            self.inoreader.app_key = Some(app_key);
        }

        if let Ok(base_url) = std::env::var("INOREADER_BASE_URL") {
            self.inoreader.base_url = base_url;
        }

        if let Ok(auth_url) = std::env::var("INOREADER_OAUTH_AUTH_URL") {
            self.inoreader.oauth_auth_url = auth_url;
        }

        if let Ok(token_url) = std::env::var("INOREADER_OAUTH_TOKEN_URL") {
            self.inoreader.oauth_token_url = token_url;
        }

        if let Ok(token_path) = std::env::var("INOREADER_TOKEN_PATH") {
            self.auth.token_path = Some(PathBuf::from(token_path));
        }

        if let Ok(redirect_uri) = std::env::var("INOREADER_REDIRECT_URI") {
            self.auth.redirect_uri = redirect_uri;
        }

        if let Ok(timeout) = std::env::var("INOREADER_REQUEST_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.api.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid INOREADER_REQUEST_TIMEOUT: {}", timeout);
            }
        }

        self.legacy_credentials_present = std::env::var("INOREADER_USERNAME").is_ok()
            || std::env::var("INOREADER_PASSWORD").is_ok();
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(token_path) = &cli.token_path {
            self.auth.token_path = Some(PathBuf::from(token_path));
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`InoreaderMcpError::Config`] when credentials are missing,
    /// when the retired username/password variables are still set, or when a
    /// numeric limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.legacy_credentials_present {
            return Err(InoreaderMcpError::Config(
                "INOREADER_USERNAME/INOREADER_PASSWORD are no longer used. \
                 Authentication now uses OAuth2: remove them from your environment \
                 and run `inoreader-mcp auth login`"
                    .to_string(),
            )
            .into());
        }

        let mut missing = Vec::new();
        if self.inoreader.app_id.as_deref().map_or(true, str::is_empty) {
            missing.push("INOREADER_APP_ID");
        }
        if self.inoreader.app_key.as_deref().map_or(true, str::is_empty) {
            missing.push("INOREADER_APP_KEY");
        }
        if !missing.is_empty() {
            return Err(InoreaderMcpError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ))
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(InoreaderMcpError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.max_articles_per_request == 0 {
            return Err(InoreaderMcpError::Config(
                "api.max_articles_per_request must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.mark_read_chunk_size == 0 {
            return Err(InoreaderMcpError::Config(
                "api.mark_read_chunk_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.auth.expiry_buffer_seconds < 0 {
            return Err(InoreaderMcpError::Config(
                "auth.expiry_buffer_seconds must not be negative".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Application ID, or a configuration error when unset
    pub fn app_id(&self) -> Result<&str> {
        self.inoreader
            .app_id
            .as_deref()
            .ok_or_else(|| InoreaderMcpError::Config("INOREADER_APP_ID is not set".into()).into())
    }

    /// Application key, or a configuration error when unset
    pub fn app_key(&self) -> Result<&str> {
        self.inoreader
            .app_key
            .as_deref()
            .ok_or_else(|| InoreaderMcpError::Config("INOREADER_APP_KEY is not set".into()).into())
    }

    /// Location of the token file
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no override is set and the user's
    /// home directory cannot be determined.
    pub fn token_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.auth.token_path {
            return Ok(path.clone());
        }
        let dirs = ProjectDirs::from("", "", "inoreader-mcp").ok_or_else(|| {
            InoreaderMcpError::Config("Could not determine a config directory".to_string())
        })?;
        Ok(dirs.config_dir().join(TOKEN_FILE_NAME))
    }

    /// Location of the pending-authorization state file (next to the tokens)
    pub fn state_path(&self) -> Result<PathBuf> {
        let token_path = self.token_path()?;
        Ok(token_path
            .parent()
            .map(|dir| dir.join(STATE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME)))
    }
}
