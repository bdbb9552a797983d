//! Shell Configuration - 지원하는 대화형 셸
//!
//! 각 셸 타입은 사용자 rc 파일 없이 대화형으로 시작하는 방법과
//! 프롬프트 토큰을 설치하는 방법을 압니다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Shell Type
// ============================================================================

/// 셸 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// Bash (기본값)
    Bash,
    /// Zsh
    Zsh,
    /// POSIX sh
    Sh,
    /// Xonsh
    Xonsh,
}

impl ShellType {
    /// 기본 실행 파일 이름 (PATH에서 탐색)
    pub fn default_executable(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Sh => "sh",
            ShellType::Xonsh => "xonsh",
        }
    }

    /// 사용자 rc 파일을 건너뛰는 대화형 세션 인자
    pub fn interactive_args(&self) -> Vec<&'static str> {
        match self {
            ShellType::Bash => vec!["--norc", "--noprofile", "--noediting", "-i"],
            ShellType::Zsh => vec!["-f", "-i"],
            ShellType::Sh => vec!["-i"],
            ShellType::Xonsh => vec!["--no-rc", "-i", "--shell-type=readline"],
        }
    }

    /// 기본 프롬프트를 `token`으로 설정하는 구문
    ///
    /// 이 구문의 에코에 토큰이 그대로 나타나지 않도록 둘로 나눕니다.
    pub fn prompt_statement(&self, token: &str) -> String {
        let mid = token.len() / 2;
        let (head, tail) = token.split_at(mid);
        match self {
            ShellType::Bash => {
                format!("PS1='{head}''{tail}'; PS2=''; unset PROMPT_COMMAND")
            }
            ShellType::Zsh => format!(
                "unsetopt zle prompt_cr prompt_sp 2>/dev/null; PS1='{head}''{tail}'; PS2=''; RPS1=''"
            ),
            ShellType::Sh => format!("PS1='{head}''{tail}'; PS2=''"),
            ShellType::Xonsh => {
                format!("$PROMPT = \"{head}\" + \"{tail}\"; $MULTILINE_PROMPT = \"\"; $RIGHT_PROMPT = \"\"")
            }
        }
    }

    /// 셸 프로세스에 강제하는 환경 변수
    pub fn session_env(&self) -> Vec<(&'static str, &'static str)> {
        let mut env = vec![("TERM", "dumb"), ("PAGER", "cat"), ("GIT_PAGER", "cat")];
        if matches!(self, ShellType::Xonsh) {
            env.push(("XONSH_COLOR_STYLE", "default"));
        }
        env
    }

    /// 실행 파일 찾기 (명시적 경로 우선, 없으면 PATH 탐색)
    pub fn resolve_executable(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) if path.is_absolute() => {
                if path.is_file() {
                    Ok(path.to_path_buf())
                } else {
                    Err(Error::Session(format!(
                        "shell executable '{}' does not exist",
                        path.display()
                    )))
                }
            }
            Some(name) => which::which(name).map_err(|e| {
                Error::Session(format!("shell '{}' not found: {}", name.display(), e))
            }),
            None => which::which(self.default_executable()).map_err(|e| {
                Error::Session(format!(
                    "shell '{}' not found in PATH: {}",
                    self.default_executable(),
                    e
                ))
            }),
        }
    }

    /// 문자열에서 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "sh" | "posix" => Some(Self::Sh),
            "xonsh" => Some(Self::Xonsh),
            _ => None,
        }
    }

    /// 모든 셸 타입
    pub fn all() -> Vec<Self> {
        vec![Self::Bash, Self::Zsh, Self::Sh, Self::Xonsh]
    }
}

impl Default for ShellType {
    fn default() -> Self {
        Self::Bash
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_executable())
    }
}

impl std::str::FromStr for ShellType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Config(format!("unknown shell type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "__SHDK_0123456789abcdef__";

    #[test]
    fn test_prompt_statement_hides_token() {
        for shell in ShellType::all() {
            let stmt = shell.prompt_statement(TOKEN);
            assert!(!stmt.contains(TOKEN), "{shell} statement leaks token: {stmt}");
        }
    }

    #[test]
    fn test_bash_prompt_statement_reassembles() {
        let stmt = ShellType::Bash.prompt_statement(TOKEN);
        // POSIX 셸에서 인접한 작은따옴표 문자열은 이어 붙음
        let reassembled = stmt
            .trim_start_matches("PS1='")
            .split("';")
            .next()
            .unwrap()
            .replace("''", "");
        assert_eq!(reassembled, TOKEN);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(ShellType::parse("BASH"), Some(ShellType::Bash));
        assert_eq!(ShellType::parse("posix"), Some(ShellType::Sh));
        assert_eq!(ShellType::parse("fish"), None);
        assert_eq!(ShellType::Xonsh.to_string(), "xonsh");
        assert!("cmd".parse::<ShellType>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let t: ShellType = serde_json::from_str("\"zsh\"").unwrap();
        assert_eq!(t, ShellType::Zsh);
        assert_eq!(serde_json::to_string(&ShellType::Sh).unwrap(), "\"sh\"");
    }

    #[test]
    fn test_term_is_dumb() {
        assert!(ShellType::Bash.session_env().contains(&("TERM", "dumb")));
    }

    #[test]
    fn test_missing_absolute_executable() {
        let err = ShellType::Bash
            .resolve_executable(Some(Path::new("/definitely/not/here/bash")))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
