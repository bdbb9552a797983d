//! read-file - 텍스트 파일 내용 반환

use async_trait::async_trait;
use dock_foundation::{Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;

use super::{parse_input, resolve_path};

#[derive(Debug, Default, Deserialize)]
pub struct ReadFileInput {
    #[serde(default)]
    pub path: Option<String>,
}

pub struct ReadFileTool;

impl ReadFileTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "read-file";
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Read File")
            .description("Reads the contents of a file.")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to read."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: ReadFileInput = parse_input(input)?;
        let Some(path) = parsed.path.filter(|p| !p.is_empty()) else {
            return Ok(ToolResult::error("Error: 'path' argument is required."));
        };

        let target = resolve_path(&path, context).await;
        if !target.exists() {
            return Ok(ToolResult::error(format!(
                "Error: File '{}' does not exist.",
                path
            )));
        }
        if !target.is_file() {
            return Ok(ToolResult::error(format!("Error: '{}' is not a file.", path)));
        }

        match fs::read_to_string(&target) {
            Ok(content) => Ok(ToolResult::text(content)
                .with_metadata("path", json!(target.display().to_string()))),
            Err(e) => Ok(ToolResult::error(format!("Error reading file: {}", e))),
        }
    }
}
