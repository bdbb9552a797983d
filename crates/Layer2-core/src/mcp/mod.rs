//! MCP - Model Context Protocol server
//!
//! Advertises the tool catalogue to an agent host and forwards tool calls
//! to the dispatcher.
//!
//! ## Transport
//! - stdio, newline-delimited JSON-RPC 2.0
//!
//! ## Reference
//! - https://modelcontextprotocol.io/

mod server;
mod transport;
mod types;

pub use server::{McpServer, PROTOCOL_VERSION, SERVER_NAME};
pub use transport::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, LineTransport};
pub use types::{McpContent, McpTool, McpToolCall, McpToolResult};
