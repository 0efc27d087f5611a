//! OAuth token persistence in a per-user JSON file
//!
//! This module provides storage and retrieval of the single active
//! [`TokenRecord`] for this installation. The record lives in one JSON file
//! (by default `~/.config/inoreader-mcp/tokens.json`) that only the owning
//! user can read or write.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so a concurrent reader sees either the previous record or the new
//! one, never a partial write. A file that exists but does not decode is an
//! error, not an absent record.
//!
//! The same directory also holds the CSRF nonce for an in-progress
//! authorization attempt, managed by [`PendingStateStore`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{InoreaderMcpError, Result};

/// Default number of seconds before `expires_at` at which a token counts as
/// expired.
pub const DEFAULT_EXPIRY_BUFFER_SECONDS: i64 = 300;

// ---------------------------------------------------------------------------
// TokenRecord
// ---------------------------------------------------------------------------

/// Persisted OAuth2 authentication state.
///
/// `expires_at` is an absolute UNIX timestamp in seconds, computed from the
/// issue time plus the lifetime declared by the token endpoint.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::auth::token_store::TokenRecord;
///
/// let record = TokenRecord {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     expires_at: chrono::Utc::now().timestamp() + 3600,
///     scope: "read write".to_string(),
/// };
/// assert!(!record.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer credential attached to API calls.
    pub access_token: String,

    /// Credential used to mint new access tokens.
    pub refresh_token: String,

    /// UNIX timestamp (seconds) after which `access_token` is invalid.
    pub expires_at: i64,

    /// Space-delimited granted scopes.
    pub scope: String,
}

impl TokenRecord {
    /// Returns `true` when the access token is expired or within the default
    /// 300-second refresh window.
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(DEFAULT_EXPIRY_BUFFER_SECONDS)
    }

    /// Returns `true` iff `now >= expires_at - buffer_seconds`.
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        self.is_expired_at(Utc::now().timestamp(), buffer_seconds)
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now: i64, buffer_seconds: i64) -> bool {
        now >= self.expires_at.saturating_sub(buffer_seconds)
    }

    /// Seconds until `expires_at`, negative once it has passed.
    pub fn seconds_remaining(&self) -> i64 {
        self.expires_at - Utc::now().timestamp()
    }
}

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// File-backed store for the active [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored record.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if no record has ever been saved.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and a serialization
    /// error if it exists but is not a complete record.
    pub fn load(&self) -> Result<Option<TokenRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::from(InoreaderMcpError::Io(e))
                    .context(format!("Failed to read tokens from {}", self.path.display())))
            }
        };

        let record: TokenRecord = serde_json::from_str(&contents)
            .map_err(InoreaderMcpError::Serialization)
            .with_context(|| format!("Failed to load tokens from {}", self.path.display()))?;
        Ok(Some(record))
    }

    /// Persists `record`, replacing any prior record.
    ///
    /// Parent directories are created as needed and the file is restricted
    /// to owner read/write.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn save(&self, record: &TokenRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        write_private_file(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to save tokens to {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "Saved OAuth tokens");
        Ok(())
    }

    /// Deletes the stored record. Removing a missing file is not an error.
    pub fn delete(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

// ---------------------------------------------------------------------------
// PendingStateStore
// ---------------------------------------------------------------------------

/// File-backed holder for the CSRF nonce between `auth login` and
/// `auth complete`.
#[derive(Debug, Clone)]
pub struct PendingStateStore {
    path: PathBuf,
}

impl PendingStateStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the nonce with owner-only permissions.
    pub fn save(&self, state: &str) -> Result<()> {
        write_private_file(&self.path, state.as_bytes())
            .with_context(|| format!("Failed to save OAuth state to {}", self.path.display()))
    }

    /// Returns the saved nonce, or `None` when no attempt is pending.
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InoreaderMcpError::Io(e).into()),
        }
    }

    /// Forgets the pending nonce.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Writes `contents` to `path` via a temp file and rename, mode `0600`.
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        set_owner_only(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InoreaderMcpError::Io(e).into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
