//! MCP Types - 도구 관련 메시지 타입

use crate::tool::ToolDescriptor;
use dock_foundation::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `tools/list` 결과 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 인자의 JSON Schema
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<ToolDescriptor> for McpTool {
    fn from(desc: ToolDescriptor) -> Self {
        Self {
            name: desc.name,
            description: Some(desc.description).filter(|d| !d.is_empty()),
            input_schema: desc.input_schema,
        }
    }
}

/// `tools/call` 파라미터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolCall {
    pub name: String,

    #[serde(default)]
    pub arguments: Value,
}

/// `tools/call` 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    pub content: Vec<McpContent>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    Text { text: String },
}

impl McpToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            McpContent::Text { text } => Some(text.as_str()),
        })
    }
}

impl From<ToolResult> for McpToolResult {
    fn from(result: ToolResult) -> Self {
        if result.is_error {
            Self::error(result.output)
        } else {
            Self::success(result.output)
        }
    }
}
