//! Core Types - 세션 엔진과 도구가 공유하는 타입

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::permission::DenyCategory;

// ============================================================================
// 타임아웃 범위
// ============================================================================

/// 호출별 타임아웃 정책: 기본값과 [min, max] 범위
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutBounds {
    pub default_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for TimeoutBounds {
    fn default() -> Self {
        Self {
            default_secs: 10.0,
            min_secs: 1.0,
            max_secs: 60.0,
        }
    }
}

impl TimeoutBounds {
    /// 선택적 지정 값을 실제 타임아웃으로 변환
    ///
    /// 범위를 벗어난 값은 거부하지 않고 잘라냅니다.
    /// 유한하지 않은 값은 기본값을 사용합니다.
    pub fn resolve(&self, requested: Option<f64>) -> Duration {
        let secs = match requested {
            Some(v) if v.is_finite() => v,
            _ => self.default_secs,
        };
        Duration::from_secs_f64(secs.clamp(self.min_secs, self.max_secs))
    }

    pub fn default_timeout(&self) -> Duration {
        self.resolve(None)
    }
}

// ============================================================================
// 명령 요청 / 결과
// ============================================================================

/// 셸 세션에서 실행할 명령어 한 줄
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub command: String,
    pub timeout: Duration,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// 끝의 줄바꿈을 뗀 명령어. 여러 줄이면 `None`
    pub fn single_line(&self) -> Option<&str> {
        let line = self.command.trim_end_matches(['\r', '\n']);
        (!line.contains(['\r', '\n'])).then_some(line)
    }
}

/// 명령 요청의 종료 방식
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// 구분자 확인, 출력 완료
    Completed,
    /// 타임아웃 내 구분자 없음 (세션은 계속 사용 가능)
    TimedOut { after_secs: u64 },
    /// 셸 스트림 종료 (EOF)
    SessionClosed,
    /// 전송 전에 안전 필터가 거부
    Rejected { category: DenyCategory, reason: String },
}

/// 캡처한 텍스트 (PTY가 전달한 stdout+stderr)와 종료 방식
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub output: String,
    pub outcome: CommandOutcome,
    /// 이 명령 실행 전에 세션에 일어난 일
    pub notice: Option<String>,
}

impl CommandResult {
    pub fn completed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: CommandOutcome::Completed,
            notice: None,
        }
    }

    pub fn timed_out(partial: impl Into<String>, timeout: Duration) -> Self {
        Self {
            output: partial.into(),
            outcome: CommandOutcome::TimedOut {
                after_secs: timeout.as_secs_f64().round() as u64,
            },
            notice: None,
        }
    }

    pub fn session_closed(partial: impl Into<String>) -> Self {
        Self {
            output: partial.into(),
            outcome: CommandOutcome::SessionClosed,
            notice: None,
        }
    }

    pub fn rejected(category: DenyCategory, reason: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            outcome: CommandOutcome::Rejected {
                category,
                reason: reason.into(),
            },
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Completed)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self.outcome, CommandOutcome::TimedOut { .. })
    }
}
