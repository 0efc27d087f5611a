//! `auth` command handlers
//!
//! `login` and `complete` run in separate processes, so the CSRF nonce
//! issued by `login` is persisted next to the token file until `complete`
//! consumes it.

use crate::api::{InoreaderClient, ResponseCache};
use crate::auth::{AuthorizationAttempt, OAuthFlow, PendingStateStore, TokenRecord, TokenStore};
use crate::cli::AuthCommand;
use crate::config::Config;
use crate::error::{InoreaderMcpError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

/// Dispatches an `auth` subcommand.
pub async fn handle_auth(command: AuthCommand, config: Config) -> Result<()> {
    match command {
        AuthCommand::Login { redirect_uri } => {
            let url = login(&config, redirect_uri.as_deref())?;
            println!("Open this URL in your browser and authorize the application:\n");
            println!("  {url}\n");
            println!("After authorizing, copy the full URL your browser was redirected to and run:\n");
            println!("  inoreader-mcp auth complete '<REDIRECT_URL>'");
            Ok(())
        }
        AuthCommand::Complete {
            redirect_url,
            redirect_uri,
        } => {
            let verified = complete(&config, &redirect_url, redirect_uri.as_deref()).await?;
            println!("Authorization complete. Tokens saved to {}", config.token_path()?.display());
            println!("Verified access: {verified} subscribed feeds");
            Ok(())
        }
        AuthCommand::Status => {
            println!("{}", status(&config)?);
            Ok(())
        }
        AuthCommand::Logout => {
            let removed = logout(&config)?;
            if removed {
                println!("Stored tokens deleted.");
            } else {
                println!("No stored tokens to delete.");
            }
            Ok(())
        }
    }
}

/// Starts an attempt, persists its nonce, and returns the URL to open.
///
/// # Errors
///
/// Returns a configuration error when credentials are missing, or an I/O
/// error when the nonce cannot be saved.
pub fn login(config: &Config, redirect_uri: Option<&str>) -> Result<Url> {
    config.validate()?;
    let flow = OAuthFlow::from_config(config)?;
    let redirect_uri = redirect_uri.unwrap_or(&config.auth.redirect_uri);

    let mut attempt = AuthorizationAttempt::new(redirect_uri);
    let url = attempt.start(&flow)?;

    let state = attempt
        .state()
        .ok_or_else(|| InoreaderMcpError::Auth("authorization attempt has no state".to_string()))?;
    let pending = PendingStateStore::new(config.state_path()?);
    pending.save(state)?;

    tracing::info!(state_file = %pending.path().display(), "Authorization URL issued");
    Ok(url)
}

/// Validates the pasted redirect, exchanges the code, saves the tokens, and
/// verifies them with one subscription listing.
///
/// Returns the number of subscriptions seen by the verification call.
///
/// # Errors
///
/// Returns [`InoreaderMcpError::CsrfMismatch`] when the redirect's state
/// does not match the saved one; the token endpoint is not contacted in that
/// case and the saved state is kept. Once the exchange succeeds the saved
/// state is deleted, even if verification then fails.
pub async fn complete(
    config: &Config,
    redirect_url: &str,
    redirect_uri: Option<&str>,
) -> Result<usize> {
    config.validate()?;
    let flow = OAuthFlow::from_config(config)?;
    let redirect_uri = redirect_uri.unwrap_or(&config.auth.redirect_uri);

    let pending = PendingStateStore::new(config.state_path()?);
    let state = pending.load()?.ok_or_else(|| {
        InoreaderMcpError::Auth(
            "no pending authorization; run `inoreader-mcp auth login` first".to_string(),
        )
    })?;

    let mut attempt = AuthorizationAttempt::resume(state, redirect_uri);
    attempt.receive_redirect(redirect_url)?;
    let record = attempt.complete(&flow).await?;
    pending.clear()?;

    let store = TokenStore::new(config.token_path()?);
    store.save(&record)?;
    tracing::info!(path = %store.path().display(), "Tokens saved");

    let mut client = InoreaderClient::connect(config, Arc::new(ResponseCache::new()))?;
    let feeds = client
        .subscription_list()
        .await
        .context("Tokens were saved but the verification request failed")?;

    Ok(feeds.subscriptions.len())
}

/// Human-readable description of the stored tokens.
pub fn status(config: &Config) -> Result<String> {
    let store = TokenStore::new(config.token_path()?);
    Ok(match store.load()? {
        None => format!(
            "Not authenticated (no tokens at {}). Run `inoreader-mcp auth login`.",
            store.path().display()
        ),
        Some(record) => describe_token(&record, config.auth.expiry_buffer_seconds),
    })
}

/// Deletes the stored tokens. Returns `false` when there were none.
pub fn logout(config: &Config) -> Result<bool> {
    let store = TokenStore::new(config.token_path()?);
    let existed = store.path().exists();
    store.delete()?;
    PendingStateStore::new(config.state_path()?).clear()?;
    Ok(existed)
}

fn describe_token(record: &TokenRecord, buffer_seconds: i64) -> String {
    let expires = DateTime::<Utc>::from_timestamp(record.expires_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| record.expires_at.to_string());

    if record.is_expired_with_buffer(buffer_seconds) {
        format!("Authenticated (scope: {}). Access token expired at {expires}; it will be refreshed on the next call.", record.scope)
    } else {
        format!(
            "Authenticated (scope: {}). Access token valid until {expires} ({} minutes left).",
            record.scope,
            record.seconds_remaining() / 60
        )
    }
}
