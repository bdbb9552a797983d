//! Configuration Loader - 설정 파일 로더
//!
//! ## 탐색 순서
//!
//! 1. 사용자 레벨: `~/.shelldock/settings.json`
//! 2. 프로젝트 레벨: `.shelldock/settings.json` (작업 디렉토리 기준)
//!
//! 뒤 레벨이 앞 레벨을 덮어씁니다. `--config`로 파일을 지정하면
//! 탐색 없이 그 파일만 읽습니다.

use super::dock::{DockConfig, DockSettings};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 설정 디렉토리 이름
pub const CONFIG_DIR_NAME: &str = ".shelldock";

/// 설정 파일 이름
pub const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// ConfigLoader
// ============================================================================

/// 계층형 설정 로더
pub struct ConfigLoader {
    search_paths: Vec<ConfigPath>,
}

#[derive(Debug, Clone)]
struct ConfigPath {
    path: PathBuf,
    /// 뒤쪽이 우선
    priority: u8,
    description: &'static str,
}

impl ConfigLoader {
    /// 작업 디렉토리 기준 기본 탐색 경로
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            paths.push(ConfigPath {
                path: home.join(CONFIG_DIR_NAME).join(SETTINGS_FILE),
                priority: 10,
                description: "User settings",
            });
        }

        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE),
            priority: 20,
            description: "Project settings",
        });

        paths.sort_by_key(|p| p.priority);
        Self { search_paths: paths }
    }

    /// 사용자 지정 탐색 경로 (낮은 우선순위부터)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i as u8,
                description: "Custom",
            })
            .collect();
        Self { search_paths }
    }

    /// 존재하는 모든 파일을 기본값 위에 병합
    ///
    /// 파일이 있는데 파싱에 실패하면 에러
    pub fn load_all(&self) -> Result<DockConfig> {
        let mut config = DockConfig::new();

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }
            let settings = load_settings_from_file(&config_path.path)?;
            info!(
                "Loaded {} from: {}",
                config_path.description,
                config_path.path.display()
            );
            config.merge(settings);
        }

        Ok(config)
    }

    /// 지정한 파일 하나만 로드 (반드시 존재해야 함)
    pub fn load_from(path: &Path) -> Result<DockConfig> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file '{}' does not exist",
                path.display()
            )));
        }
        let mut config = DockConfig::new();
        config.merge(load_settings_from_file(path)?);
        Ok(config)
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.path.exists())
            .map(|p| p.path.clone())
            .collect()
    }
}

// ============================================================================
// 유틸리티
// ============================================================================

/// 설정 파일 하나 파싱 (`//`, `/* */` 주석 허용 JSON)
pub fn load_settings_from_file(path: &Path) -> Result<DockSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let content = strip_json_comments(&content);

    let settings: DockSettings = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid settings.json at {}: {}", path.display(), e))
    })?;

    debug!(
        "Parsed {}: shell={:?}, {} extra deny patterns",
        path.display(),
        settings.shell,
        settings.extra_deny_patterns.len()
    );

    Ok(settings)
}

/// 문자열 밖의 `//` 줄 주석과 `/* */` 블록 주석 제거
pub fn strip_json_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            output.push(c);
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            output.push(c);
            escape_next = true;
            continue;
        }

        if c == '"' {
            in_string = !in_string;
            output.push(c);
            continue;
        }

        if !in_string && c == '/' {
            match chars.peek() {
                Some('/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            output.push(c);
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
        }

        output.push(c);
    }

    output
}
