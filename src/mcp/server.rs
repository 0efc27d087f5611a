//! Line-delimited JSON-RPC server over stdio
//!
//! Each input line is one JSON-RPC message; each response is written as one
//! line of JSON. Requests are handled strictly one at a time, so a tool call
//! finishes before the next line is read.

use crate::error::Result;
use crate::mcp::types::{
    CallToolParams, CallToolResponse, Implementation, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, METHOD_INITIALIZE, METHOD_NOT_FOUND,
    METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PROTOCOL_VERSION, SERVER_NAME,
};
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// MCP server dispatching `tools/*` requests to a [`ToolRegistry`].
pub struct McpServer {
    registry: ToolRegistry,
    server_info: Implementation,
}

impl McpServer {
    /// Creates a server over `registry`.
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Serves stdin and stdout until stdin closes.
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serves one line-delimited stream until EOF.
    ///
    /// Lines that are not valid UTF-8 are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading or writing the stream fails.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(tools = self.registry.len(), "MCP server listening on stdio");
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Dropping input line that is not valid UTF-8: {}", e);
                    continue;
                }
            };
            if let Some(response) = self.handle_line(line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handles one input line, returning the serialized response, if any.
    ///
    /// Blank lines, notifications, and lines that are not valid JSON-RPC
    /// produce no output.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Dropping malformed JSON-RPC message: {}", e);
                return None;
            }
        };

        let response = self.handle_request(request).await?;
        match serde_json::to_string(&response) {
            Ok(serialized) => Some(serialized),
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Dispatches one request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::info!(method = %request.method, "Received request");

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification acknowledged");
            return None;
        }
        let id = request.id.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(id),
            METHOD_PING => JsonRpcResponse::success(id, json!({})),
            METHOD_TOOLS_LIST => JsonRpcResponse::success(
                id,
                json!({ "tools": self.registry.all_definitions() }),
            ),
            METHOD_TOOLS_CALL => self.call_tool(id, request.params).await,
            other => {
                tracing::warn!(method = other, "Unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}"))
            }
        };
        Some(response)
    }

    fn initialize(&self, id: Value) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({ "tools": {} }),
            server_info: self.server_info.clone(),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let result = match self.registry.get(&params.name) {
            Some(executor) => {
                tracing::info!(tool = %params.name, "Calling tool");
                let args = params.arguments.unwrap_or_else(|| json!({}));
                match executor.execute(args).await {
                    Ok(result) => CallToolResponse::text(result.to_message(), !result.success),
                    Err(e) => {
                        tracing::error!(tool = %params.name, "Tool execution failed: {:#}", e);
                        CallToolResponse::text(format!("Error: {e}"), true)
                    }
                }
            }
            None => {
                tracing::warn!(tool = %params.name, "Unknown tool");
                CallToolResponse::text(format!("Error: Unknown tool: {}", params.name), true)
            }
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}
