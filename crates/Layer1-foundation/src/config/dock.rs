//! Dock Config - 최종 런타임 설정
//!
//! `DockSettings`: 설정 파일 한 개의 내용 (모든 필드 선택)
//! `DockConfig`: 기본값 위에 파일과 CLI 옵션을 병합한 최종 설정

use crate::core::TimeoutBounds;
use crate::permission::DenyPattern;
use crate::registry::ShellType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// 명령어별 기본 타임아웃 (초)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 10.0;
/// 호출별 지정 값의 하한
pub const MIN_COMMAND_TIMEOUT_SECS: f64 = 1.0;
/// 호출별 지정 값의 상한
pub const MAX_COMMAND_TIMEOUT_SECS: f64 = 60.0;

// ============================================================================
// PTY size
// ============================================================================

/// PTY 크기 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtySizeConfig {
    pub rows: u16,
    /// 긴 명령어 에코가 줄바꿈되지 않도록 넓게 유지
    pub cols: u16,
}

impl Default for PtySizeConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 4096,
        }
    }
}

// ============================================================================
// DockSettings (파일 내용)
// ============================================================================

/// `settings.json` 한 개의 내용
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<ShellType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_timeout_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timeout_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_timeout_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_grace_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pty: Option<PtySizeConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// 내장 거부 패턴 뒤에 추가
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_deny_patterns: Vec<DenyPattern>,

    /// 셸에 추가할 환경 변수
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

// ============================================================================
// DockConfig (최종)
// ============================================================================

/// ShellDock 최종 설정
#[derive(Debug, Clone, PartialEq)]
pub struct DockConfig {
    pub shell: ShellType,
    pub shell_path: Option<PathBuf>,
    pub timeouts: TimeoutBounds,
    pub startup_timeout: Duration,
    pub close_grace: Duration,
    pub pty: PtySizeConfig,
    pub working_dir: Option<PathBuf>,
    pub extra_deny_patterns: Vec<DenyPattern>,
    pub env: HashMap<String, String>,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            shell: ShellType::default(),
            shell_path: None,
            timeouts: TimeoutBounds {
                default_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
                min_secs: MIN_COMMAND_TIMEOUT_SECS,
                max_secs: MAX_COMMAND_TIMEOUT_SECS,
            },
            startup_timeout: Duration::from_secs(10),
            close_grace: Duration::from_millis(500),
            pty: PtySizeConfig::default(),
            working_dir: None,
            extra_deny_patterns: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl DockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정 레이어 하나 적용 (있는 필드는 덮어쓰고 목록은 이어붙임)
    pub fn merge(&mut self, settings: DockSettings) {
        if let Some(shell) = settings.shell {
            self.shell = shell;
        }
        if settings.shell_path.is_some() {
            self.shell_path = settings.shell_path;
        }
        if let Some(v) = settings.default_timeout_secs {
            self.timeouts.default_secs = v;
        }
        if let Some(v) = settings.min_timeout_secs {
            self.timeouts.min_secs = v;
        }
        if let Some(v) = settings.max_timeout_secs {
            self.timeouts.max_secs = v;
        }
        if let Some(v) = settings.startup_timeout_secs {
            if v.is_finite() && v > 0.0 {
                self.startup_timeout = Duration::from_secs_f64(v);
            }
        }
        if let Some(ms) = settings.close_grace_ms {
            self.close_grace = Duration::from_millis(ms);
        }
        if let Some(pty) = settings.pty {
            self.pty = pty;
        }
        if settings.working_dir.is_some() {
            self.working_dir = settings.working_dir;
        }
        self.extra_deny_patterns.extend(settings.extra_deny_patterns);
        self.env.extend(settings.env);
    }

    /// 모순된 타임아웃 범위와 잘못된 PTY 크기 거부
    pub fn validate(&self) -> Result<()> {
        let t = &self.timeouts;
        for (name, v) in [
            ("defaultTimeoutSecs", t.default_secs),
            ("minTimeoutSecs", t.min_secs),
            ("maxTimeoutSecs", t.max_secs),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::Config(format!("{name} must be a positive number, got {v}")));
            }
        }
        if t.min_secs < 1.0 {
            return Err(Error::Config(format!(
                "minTimeoutSecs must be at least 1, got {}",
                t.min_secs
            )));
        }
        if !(t.min_secs <= t.default_secs && t.default_secs <= t.max_secs) {
            return Err(Error::Config(format!(
                "timeouts must satisfy min <= default <= max (got {} / {} / {})",
                t.min_secs, t.default_secs, t.max_secs
            )));
        }
        if self.pty.rows == 0 || self.pty.cols == 0 {
            return Err(Error::Config("pty rows and cols must be non-zero".to_string()));
        }
        Ok(())
    }
}
