//! Error types for inoreader-mcp
//!
//! This module defines all error types used throughout the bridge,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for inoreader-mcp operations
///
/// The variants follow the failure taxonomy of the bridge: configuration
/// problems are fatal at startup, authorization problems require the
/// operator to restart the OAuth flow, API failures become tool-level error
/// results, and I/O failures abort only the operation that hit them.
#[derive(Error, Debug)]
pub enum InoreaderMcpError {
    /// Missing or invalid configuration (credentials, limits, paths)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token exchange or refresh failure
    #[error("Authorization error: {0}")]
    Auth(String),

    /// The `state` echoed in the OAuth callback did not match the one issued
    #[error("Authorization error: state parameter mismatch (possible CSRF), restart the authorization flow")]
    CsrfMismatch,

    /// No token has been stored yet
    #[error("Not authenticated: no stored tokens, run `inoreader-mcp auth login` first")]
    NotAuthenticated,

    /// Non-success HTTP status from the Inoreader API
    #[error("API error: status={status}, body={body}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Tool argument or execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors (connect failures, timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for inoreader-mcp operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to recover the typed [`InoreaderMcpError`] with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
