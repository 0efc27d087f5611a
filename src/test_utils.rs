//! Test utilities for inoreader-mcp
//!
//! Temporary token locations, a credentialed configuration, and token
//! records with a chosen lifetime.

use crate::auth::TokenRecord;
use crate::config::Config;
use chrono::Utc;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Configuration with credentials whose token and state files live in `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.inoreader.app_id = Some("1000000001".to_string());
    config.inoreader.app_key = Some("test_app_key".to_string());
    config.auth.token_path = Some(dir.path().join("tokens.json"));
    config
}

/// Token record expiring `expires_in` seconds from now (negative for past)
pub fn token_expiring_in(expires_in: i64) -> TokenRecord {
    TokenRecord {
        access_token: "test_access_token".to_string(),
        refresh_token: "test_refresh_token".to_string(),
        expires_at: Utc::now().timestamp() + expires_in,
        scope: "read write".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid_and_isolated() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert!(config.validate().is_ok());
        assert!(config.token_path().unwrap().starts_with(dir.path()));
    }

    #[test]
    fn test_token_expiring_in() {
        assert!(!token_expiring_in(3600).is_expired());
        assert!(token_expiring_in(-10).is_expired());
    }
}
