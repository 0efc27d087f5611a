//! Tools module for inoreader-mcp
//!
//! This module contains the tool executor trait, the tool registry, and the
//! Inoreader tool implementations exposed over MCP.
//!
//! # Module Layout
//!
//! - [`articles`]         -- listing, search, content, read state, statistics
//! - [`feeds`]            -- subscription management
//! - [`tags`]             -- folders, tags, and per-article states
//! - [`format`]           -- text rendering shared by the executors
//! - [`registry_builder`] -- assembles the full catalog

pub mod articles;
pub mod feeds;
pub mod format;
pub mod registry_builder;
pub mod tags;

pub use registry_builder::build_registry;

use crate::api::{InoreaderClient, ResponseCache};
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool result structure
///
/// Represents the text payload returned to the MCP client and whether it
/// describes a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed tool result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Convert to the text shown to the client
    pub fn to_message(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```
/// use inoreader_mcp::tools::{ToolExecutor, ToolResult};
/// use inoreader_mcp::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolExecutor for Echo {
///     fn tool_definition(&self) -> Value {
///         serde_json::json!({
///             "name": "echo",
///             "description": "Echoes its input",
///             "inputSchema": {"type": "object", "properties": {}, "required": []}
///         })
///     }
///
///     async fn execute(&self, args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success(args.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the MCP tool definition
    ///
    /// ```json
    /// {
    ///   "name": "tool_name",
    ///   "description": "Tool description",
    ///   "inputSchema": {
    ///     "type": "object",
    ///     "properties": {"param1": {"type": "string", "description": "..."}},
    ///     "required": ["param1"]
    ///   }
    /// }
    /// ```
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Implementations report their own failures as error results; an `Err`
    /// here means the executor could not run at all.
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Tool registry for managing available tools
///
/// Definitions are listed in registration order.
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            tools: HashMap::new(),
        }
    }

    /// Register a tool executor, replacing any previous one of the same name
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        let name = name.into();
        if self.tools.insert(name.clone(), executor).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// All tool definitions in registration order
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state handed to every Inoreader tool
///
/// Each call builds its own [`InoreaderClient`]; the response cache outlives
/// the calls.
#[derive(Debug, Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    cache: Arc<ResponseCache>,
}

impl ToolContext {
    /// Creates a context over a validated configuration.
    pub fn new(config: Arc<Config>, cache: Arc<ResponseCache>) -> Self {
        Self { config, cache }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connects a client for one call.
    pub fn client(&self) -> Result<InoreaderClient> {
        InoreaderClient::connect(&self.config, Arc::clone(&self.cache))
    }

    /// Clamps a requested article count to `1..=max_articles_per_request`.
    pub fn clamp_limit(&self, requested: usize) -> usize {
        requested.clamp(1, self.config.api.max_articles_per_request.max(1))
    }
}

/// Turns an executor failure into an error result.
pub(crate) fn failure(action: &str, err: anyhow::Error) -> ToolResult {
    tracing::error!("Failed to {}: {:#}", action, err);
    ToolResult::error(format!("Failed to {action}: {err}"))
}

/// Decodes tool arguments, treating `null` as an empty object.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: serde_json::Value) -> Result<T> {
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| {
        crate::error::InoreaderMcpError::Tool(format!("invalid arguments: {e}")).into()
    })
}
