//! Core Traits - 도구 인터페이스와 실행 컨텍스트
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer4-CLI                                                 │
//! │  └── MCP stdio host                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Core                                                │
//! │  ├── Tool 구현 (run-command, read-file, ...)                │
//! │  ├── ToolContext 구현 (RuntimeContext)                      │
//! │  └── 세션 엔진 (PTY, 프롬프트 동기화, 실행기)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (현재 레이어)                            │
//! │  ├── Trait 정의 (Tool, ToolContext)                         │
//! │  ├── 거부 패턴 집합                                         │
//! │  └── 설정 및 셸 레지스트리                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::permission::Verdict;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use super::types::{CommandRequest, CommandResult, TimeoutBounds};

// ============================================================================
// Tool Trait
// ============================================================================

/// Tool 메타데이터
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// 고유 도구 이름
    pub name: String,
    /// 표시 이름
    pub display_name: String,
    /// 에이전트에게 알리는 설명
    pub description: String,
    /// 카테고리 (execute, filesystem)
    pub category: String,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// 도구 호출 결과 (항상 텍스트 하나)
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecutionResult {
    /// 텍스트가 실패를 설명하면 true
    pub is_error: bool,
    /// 에이전트에게 반환할 텍스트
    pub output: String,
    /// 추가 메타데이터 (outcome 태그, 해석된 경로)
    pub metadata: HashMap<String, Value>,
}

impl ToolExecutionResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            is_error: false,
            output: output.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            output: message.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

pub type ToolResult = ToolExecutionResult;

/// Tool 인터페이스
///
/// Layer2-core에서 구현. 도구 목록은 고정이며 시작 시 dispatcher에
/// 명시적으로 전달됩니다.
#[async_trait]
pub trait Tool: Send + Sync {
    /// 디스패치 키로 쓰는 고유 이름
    fn name(&self) -> &str;

    /// 도구 메타데이터
    fn meta(&self) -> ToolMeta;

    /// 입력 객체의 JSON 스키마
    fn schema(&self) -> Value;

    /// 도구 실행
    ///
    /// 호출 단위 실패는 `ToolResult::error` 텍스트로 반환.
    /// `Err`는 dispatcher가 직접 변환하는 오류에만 사용.
    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult>;
}

// ============================================================================
// Tool Context
// ============================================================================

/// 도구가 실행 중인 서버에 요청할 수 있는 것
#[async_trait]
pub trait ToolContext: Send + Sync {
    /// 거부 패턴으로 명령어 검사 (I/O 없음)
    fn check_command(&self, command: &str) -> Verdict;

    /// run-command 타임아웃 정책
    fn timeout_bounds(&self) -> TimeoutBounds;

    /// 세션 실행기로 명령어 하나 실행
    ///
    /// `Err`는 사용 가능한 세션을 얻지 못한 경우 (spawn 또는 시작 실패)
    async fn run_command(&self, request: CommandRequest) -> Result<CommandResult>;

    /// 셸의 현재 작업 디렉토리. 조회 실패 시 서버 프로세스의 디렉토리
    async fn working_dir(&self) -> PathBuf;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_meta_builder() {
        let meta = ToolMeta::new("read-file")
            .display_name("Read File")
            .description("Read a file")
            .category("filesystem");
        assert_eq!(meta.name, "read-file");
        assert_eq!(meta.display_name, "Read File");
        assert_eq!(meta.category, "filesystem");
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::text("hello");
        assert!(!ok.is_error);
        assert_eq!(ok.output, "hello");

        let err = ToolResult::error("bad").with_metadata("outcome", json!("rejected"));
        assert!(err.is_error);
        assert_eq!(err.metadata.get("outcome"), Some(&json!("rejected")));
    }
}
