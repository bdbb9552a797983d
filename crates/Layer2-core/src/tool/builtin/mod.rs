//! Builtin Tools
//!
//! ### Execute
//! - `run-command` - 영속 셸 세션에서 명령어 실행
//!
//! ### Filesystem
//! - `read-file` - 텍스트 파일 읽기
//! - `write-file` - 파일 생성/덮어쓰기 (상위 디렉토리 자동 생성)
//! - `list-directory` - 정렬된 항목, 디렉토리는 `/` 접미사
//!
//! 상대 경로는 셸의 현재 작업 디렉토리 기준으로 해석되므로
//! `run-command`의 `cd`가 파일시스템 도구에도 이어집니다.

pub mod list_directory;
pub mod read_file;
pub mod run_command;
pub mod write_file;

pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use write_file::WriteFileTool;

use dock_foundation::{Error, Result, Tool, ToolContext};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 전체 도구 목록 (노출 순서)
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(RunCommandTool::new()) as Arc<dyn Tool>,
        Arc::new(ReadFileTool::new()),
        Arc::new(WriteFileTool::new()),
        Arc::new(ListDirectoryTool::new()),
    ]
}

/// 도구 입력 역직렬화 (`null` 인자는 `{}`로 취급)
pub(crate) fn parse_input<T: DeserializeOwned + Default>(input: Value) -> Result<T> {
    if input.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(input).map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))
}

/// 절대 경로는 그대로, 상대 경로는 세션 디렉토리에 결합
pub(crate) async fn resolve_path(path: &str, context: &dyn ToolContext) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    context.working_dir().await.join(path)
}
