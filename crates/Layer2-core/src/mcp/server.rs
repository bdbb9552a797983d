//! MCP Server - exposes the tool dispatcher over stdio
//!
//! Handles `initialize`, `ping`, `tools/list` and `tools/call`.
//! Notifications are accepted silently.

use super::transport::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, LineTransport};
use super::types::{McpTool, McpToolCall, McpToolResult};
use crate::tool::ToolDispatcher;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "shelldock";

pub struct McpServer {
    dispatcher: Arc<ToolDispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Process requests until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut transport = LineTransport::new(reader, writer);
        info!("MCP server ready ({} tools)", self.dispatcher.len());

        while let Some(line) = transport.next_line().await? {
            if let Some(response) = self.handle_message(&line).await {
                transport.send(&response).await?;
            }
        }

        info!("MCP input closed");
        Ok(())
    }

    /// One inbound line -> at most one response
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable MCP message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid MCP request: {}", e);
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                return Some(JsonRpcResponse::failure(id, JsonRpcError::invalid_request()));
            }
        };

        let Some(id) = request.id.clone() else {
            debug!("MCP notification: {}", request.method);
            return None;
        };

        debug!("MCP request {}: {}", id, request.method);
        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(Self::initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize_result() -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<McpTool> = self
            .dispatcher
            .list()
            .into_iter()
            .map(McpTool::from)
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params =
            params.ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))?;
        let call: McpToolCall = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let result = McpToolResult::from(self.dispatcher.invoke(&call.name, call.arguments).await);
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}
