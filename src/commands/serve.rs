//! `serve` command handler

use crate::api::ResponseCache;
use crate::config::Config;
use crate::error::Result;
use crate::mcp::McpServer;
use crate::tools::build_registry;
use std::sync::Arc;

/// Runs the MCP server on stdin/stdout until stdin closes.
///
/// Missing tokens do not stop the server; each tool call reports the
/// problem instead so the client can surface it.
///
/// # Errors
///
/// Returns an error if stdin or stdout fail.
pub async fn run_server(config: Config) -> Result<()> {
    match config.token_path() {
        Ok(path) if !path.exists() => tracing::warn!(
            path = %path.display(),
            "No stored tokens; run `inoreader-mcp auth login` before calling tools"
        ),
        Ok(path) => tracing::debug!(path = %path.display(), "Using stored tokens"),
        Err(e) => tracing::warn!("Cannot resolve token path: {}", e),
    }

    let cache = Arc::new(ResponseCache::new());
    let registry = build_registry(Arc::new(config), cache);
    McpServer::new(registry).run_stdio().await
}
