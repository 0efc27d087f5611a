//! Shared helpers for integration tests
//!
//! Builds a configuration whose API and OAuth endpoints point at a wiremock
//! server and whose token file lives in a temporary directory.

use std::path::PathBuf;

use chrono::Utc;
use inoreader_mcp::auth::{TokenRecord, TokenStore};
use inoreader_mcp::config::Config;
use tempfile::TempDir;

/// API base path mounted on the mock server.
#[allow(dead_code)]
pub const API_PREFIX: &str = "/reader/api/0";

/// Configuration pointing every endpoint at `server_uri`.
#[allow(dead_code)]
pub fn mock_config(server_uri: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.inoreader.app_id = Some("1000000001".to_string());
    config.inoreader.app_key = Some("test_app_key".to_string());
    config.inoreader.base_url = format!("{server_uri}{API_PREFIX}");
    config.inoreader.oauth_auth_url = format!("{server_uri}/oauth2/auth");
    config.inoreader.oauth_token_url = format!("{server_uri}/oauth2/token");
    config.auth.token_path = Some(dir.path().join("tokens.json"));
    config
}

/// Token record expiring `expires_in` seconds from now.
#[allow(dead_code)]
pub fn token_expiring_in(access_token: &str, expires_in: i64) -> TokenRecord {
    TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: "stored_refresh_token".to_string(),
        expires_at: Utc::now().timestamp() + expires_in,
        scope: "read write".to_string(),
    }
}

/// Writes `record` to the configured token file.
#[allow(dead_code)]
pub fn store_token(config: &Config, record: &TokenRecord) -> PathBuf {
    let path = config.token_path().expect("token path");
    TokenStore::new(path.clone())
        .save(record)
        .expect("failed to save token");
    path
}

/// Writes a token valid for one hour.
#[allow(dead_code)]
pub fn store_valid_token(config: &Config) -> PathBuf {
    store_token(config, &token_expiring_in("valid_access_token", 3600))
}

/// Minimal reading-list article.
#[allow(dead_code)]
pub fn article_json(id: &str, title: &str, summary: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "author": "Jane Writer",
        "published": 1_700_000_000,
        "categories": ["user/1005/state/com.google/reading-list"],
        "canonical": [{"href": format!("https://example.com/{id}")}],
        "summary": {"content": format!("<p>{summary}</p>")},
        "origin": {"streamId": "feed/https://example.com/rss", "title": "Example Feed"}
    })
}
