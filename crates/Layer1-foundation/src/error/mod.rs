//! Error types for ShellDock
//!
//! 모든 레이어가 공유하는 중앙 에러 타입

use thiserror::Error;

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;

/// ShellDock 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 셸 세션
    // ========================================================================
    #[error("Session error: {0}")]
    Session(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 도구
    // ========================================================================
    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool} - {message}")]
    ToolExecution { tool: String, message: String },

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 메시지를 에이전트에게 그대로 보여줘도 되는지
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::ToolNotFound(_) | Error::Timeout(_)
        )
    }

    /// 도구 실행 실패 헬퍼
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(Error::InvalidInput("missing path".into()).is_user_facing());
        assert!(Error::ToolNotFound("nope".into()).is_user_facing());
        assert!(!Error::Session("spawn failed".into()).is_user_facing());
    }

    #[test]
    fn test_tool_execution_display() {
        let err = Error::tool_execution("read-file", "boom");
        assert_eq!(err.to_string(), "Tool execution failed: read-file - boom");
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
