//! write-file - 파일 생성 또는 덮어쓰기
//!
//! 없는 상위 디렉토리는 생성합니다.

use async_trait::async_trait;
use dock_foundation::{Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::{parse_input, resolve_path};

#[derive(Debug, Default, Deserialize)]
pub struct WriteFileInput {
    #[serde(default)]
    pub path: Option<String>,

    /// 빈 문자열 허용 (없을 때만 에러)
    #[serde(default)]
    pub content: Option<String>,
}

pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "write-file";

    fn write(target: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)
    }
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Write File")
            .description("Writes content to a file. Overwrites existing files.")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: WriteFileInput = parse_input(input)?;
        let Some(path) = parsed.path.filter(|p| !p.is_empty()) else {
            return Ok(ToolResult::error("Error: 'path' argument is required."));
        };
        let Some(content) = parsed.content else {
            return Ok(ToolResult::error("Error: 'content' argument is required."));
        };

        let target = resolve_path(&path, context).await;
        match Self::write(&target, &content) {
            Ok(()) => Ok(ToolResult::text(format!("Successfully wrote to '{}'.", path))
                .with_metadata("path", json!(target.display().to_string()))
                .with_metadata("bytes", json!(content.len()))),
            Err(e) => Ok(ToolResult::error(format!("Error writing file: {}", e))),
        }
    }
}
