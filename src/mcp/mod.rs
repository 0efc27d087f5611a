//! MCP stdio server
//!
//! # Module Layout
//!
//! - [`types`]  -- JSON-RPC 2.0 primitives and the MCP payloads the server emits
//! - [`server`] -- line-delimited request loop and method dispatch

pub mod server;
pub mod types;

pub use server::McpServer;
