//! inoreader-mcp - Inoreader tools over the Model Context Protocol
//!
//! This library provides a stdio JSON-RPC server that exposes an Inoreader
//! account as MCP tools, together with the OAuth2 machinery it needs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: OAuth2 authorization code flow and token persistence
//! - `api`: authenticated request layer, response cache, and wire models
//! - `tools`: MCP tool executors and the tool registry
//! - `mcp`: JSON-RPC types and the stdio server loop
//! - `commands`: CLI command handlers (`serve`, `auth ...`)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use inoreader_mcp::cli::Cli;
//! use inoreader_mcp::commands::serve::run_server;
//! use inoreader_mcp::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None, &Cli::default())?;
//!     config.validate()?;
//!     run_server(config).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;

// Re-export commonly used types
pub use api::{InoreaderClient, ResponseCache};
pub use auth::{OAuthFlow, TokenRecord, TokenStore};
pub use config::Config;
pub use error::{InoreaderMcpError, Result};
pub use mcp::McpServer;

#[cfg(test)]
pub mod test_utils;
