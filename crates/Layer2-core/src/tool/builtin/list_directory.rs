//! list-directory - 정렬된 항목을 줄바꿈으로 연결 (디렉토리는 `/`로 끝남)

use async_trait::async_trait;
use dock_foundation::{Result, Tool, ToolContext, ToolMeta, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::{parse_input, resolve_path};

#[derive(Debug, Default, Deserialize)]
pub struct ListDirectoryInput {
    /// 기본값은 세션의 현재 디렉토리
    #[serde(default)]
    pub path: Option<String>,
}

pub struct ListDirectoryTool;

impl ListDirectoryTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "list-directory";

    fn entries(dir: &Path) -> std::io::Result<Vec<String>> {
        let mut items = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a link to a directory is listed as one
            if entry.path().is_dir() {
                items.push(format!("{name}/"));
            } else {
                items.push(name);
            }
        }
        items.sort();
        Ok(items)
    }
}

impl Default for ListDirectoryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("List Directory")
            .description("Lists the files and subdirectories in the specified directory.")
            .category("filesystem")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to list. Defaults to current directory if omitted."
                }
            }
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: ListDirectoryInput = parse_input(input)?;
        let path = parsed
            .path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());

        let target = resolve_path(&path, context).await;
        if !target.exists() {
            return Ok(ToolResult::error(format!(
                "Error: Directory '{}' does not exist.",
                path
            )));
        }
        if !target.is_dir() {
            return Ok(ToolResult::error(format!(
                "Error: '{}' is not a directory.",
                path
            )));
        }

        match Self::entries(&target) {
            Ok(items) => Ok(ToolResult::text(items.join("\n"))
                .with_metadata("count", json!(items.len()))),
            Err(e) => Ok(ToolResult::error(format!("Error listing directory: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::builtin::test_support::DirContext;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sorted_with_directory_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let ctx = DirContext(dir.path().to_path_buf());

        let result = ListDirectoryTool::new().execute(json!({}), &ctx).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, "a.txt\nb.txt\nsrc/");
    }

    #[tokio::test]
    async fn test_empty_directory_is_empty_text() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let ctx = DirContext(dir.path().to_path_buf());

        let result = ListDirectoryTool::new()
            .execute(json!({"path": "empty"}), &ctx)
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, "");
    }

    #[tokio::test]
    async fn test_missing_and_not_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file"), "x").unwrap();
        let ctx = DirContext(dir.path().to_path_buf());
        let tool = ListDirectoryTool::new();

        let result = tool.execute(json!({"path": "ghost"}), &ctx).await.unwrap();
        assert_eq!(result.output, "Error: Directory 'ghost' does not exist.");

        let result = tool.execute(json!({"path": "file"}), &ctx).await.unwrap();
        assert_eq!(result.output, "Error: 'file' is not a directory.");
    }
}
