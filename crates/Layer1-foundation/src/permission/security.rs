//! Security - 셸 명령어 거부 패턴
//!
//! 패턴 집합은 시작 시 한 번 대소문자 무시로 컴파일되며 이후 변경되지 않습니다.
//! 패턴은 정규화된 명령어(공백 하나, 소문자) 기준으로 작성합니다.

use crate::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================
// 거부 분류
// ============================================================

/// 거부 패턴 분류 (문서화용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyCategory {
    DestructiveFilesystem,
    ResourceExhaustion,
    PrivilegeEscalation,
    RemoteCodeExecution,
    CredentialExposure,
    NetworkAttack,
    PackageManagement,
    InformationGathering,
    /// 사용자 설정에서 추가된 패턴
    Custom,
}

impl DenyCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DenyCategory::DestructiveFilesystem => "destructive filesystem operation",
            DenyCategory::ResourceExhaustion => "resource exhaustion",
            DenyCategory::PrivilegeEscalation => "privilege escalation",
            DenyCategory::RemoteCodeExecution => "remote code execution",
            DenyCategory::CredentialExposure => "credential exposure",
            DenyCategory::NetworkAttack => "network scanning or attack tooling",
            DenyCategory::PackageManagement => "destructive package management",
            DenyCategory::InformationGathering => "invasive information gathering",
            DenyCategory::Custom => "custom rule",
        }
    }
}

impl fmt::Display for DenyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================
// 패턴 정의
// ============================================================

/// 컴파일 전 거부 패턴
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyPattern {
    pub pattern: String,
    pub reason: String,
    #[serde(default = "default_custom_category")]
    pub category: DenyCategory,
}

fn default_custom_category() -> DenyCategory {
    DenyCategory::Custom
}

impl DenyPattern {
    pub fn new(
        category: DenyCategory,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            reason: reason.into(),
            category,
        }
    }
}

/// 명령어 시작, 구분자 또는 sudo 바로 뒤에서 매칭
const CMD_POS: &str = r"(^|[;&|(]\s*|\bsudo\s+)";

/// 내장 거부 패턴 (분류별)
pub fn builtin_deny_patterns() -> Vec<DenyPattern> {
    use DenyCategory::*;

    vec![
        // 파일시스템 파괴
        DenyPattern::new(
            DestructiveFilesystem,
            r"\brm\s+(-[a-z-]+\s+)*(-[a-z]*r[a-z]*|--recursive)\s+(-[a-z-]+\s+)*(/\*?|~/?\*?|\$home/?\*?|\*)(\s|;|&|\||$)",
            "Recursive deletion of root, home or everything in place",
        ),
        DenyPattern::new(DestructiveFilesystem, r"--no-preserve-root", "Root filesystem deletion"),
        DenyPattern::new(
            DestructiveFilesystem,
            r"\bfind\s+/\S*(\s.*)?\s-delete\b",
            "Mass deletion from an absolute path",
        ),
        DenyPattern::new(DestructiveFilesystem, r"\bmkfs\b", "Filesystem format"),
        DenyPattern::new(DestructiveFilesystem, r"\b(fdisk|sfdisk|gdisk|parted|wipefs)\b", "Disk partitioning"),
        DenyPattern::new(
            DestructiveFilesystem,
            r"\bdd\s+.*\bof=/dev/(sd|hd|vd|xvd|nvme|mmcblk|disk|mem)",
            "Raw device overwrite",
        ),
        DenyPattern::new(DestructiveFilesystem, r">\s*/dev/(sd|hd|vd|xvd|nvme)[a-z0-9]*", "Raw device overwrite"),
        DenyPattern::new(DestructiveFilesystem, r"\bshred\b.*\s/dev/", "Device shredding"),
        // Fork bomb 및 자원 고갈
        DenyPattern::new(
            ResourceExhaustion,
            r":\s*\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
            "Fork bomb",
        ),
        DenyPattern::new(
            ResourceExhaustion,
            r"\bdd\s+if=/dev/(zero|u?random)\b.*\bcount=\d{3,}",
            "Large file creation",
        ),
        DenyPattern::new(ResourceExhaustion, r"\bwhile\s+true\b.*\bmalloc\b", "Memory exhaustion loop"),
        DenyPattern::new(
            ResourceExhaustion,
            r"\b(while\s+(true|:|\[\s*1\s*\])|until\s+false)\s*;\s*do\b",
            "Infinite loop",
        ),
        DenyPattern::new(
            ResourceExhaustion,
            format!(r"{CMD_POS}yes(\s+[^|;&>]+)?\s*(>|;|&|$)"),
            "Unbounded output flood",
        ),
        // 권한 상승 및 시스템 제어
        DenyPattern::new(
            PrivilegeEscalation,
            r"\bsudo\s+(-[a-z]*[is][a-z]*\b|su\b|bash\b|sh\b|zsh\b)",
            "Privilege escalation to a root shell",
        ),
        DenyPattern::new(PrivilegeEscalation, r"\bsu\s+(-(\s|$)|-l\b|--login\b|root\b)", "Switching to root"),
        DenyPattern::new(
            PrivilegeEscalation,
            format!(r"{CMD_POS}(shutdown|reboot|halt|poweroff)\b"),
            "System shutdown",
        ),
        DenyPattern::new(PrivilegeEscalation, format!(r"{CMD_POS}init\s+[06]\b"), "System halt"),
        DenyPattern::new(PrivilegeEscalation, r"\b(killall|pkill)\s+-(9|kill)\b", "Force kill of processes by name"),
        DenyPattern::new(PrivilegeEscalation, r"\bkill\s+-(9|kill)\s+-1\b", "Kill all processes"),
        DenyPattern::new(
            PrivilegeEscalation,
            r"\bchmod\s+(-[a-z]+\s+)*([ugoa]*\+[a-z]*s|[2467]75[05])\b",
            "Setting the SUID/SGID bit",
        ),
        DenyPattern::new(PrivilegeEscalation, r"\bchmod\s+(-[a-z]+\s+)*777\s+/(\s|$)", "Dangerous permission change"),
        DenyPattern::new(PrivilegeEscalation, r"\bchown\s+(-[a-z]+\s+)*\S+\s+/(\s|$)", "Dangerous ownership change"),
        DenyPattern::new(
            PrivilegeEscalation,
            r"\bsystemctl\s+(stop|disable|mask|reboot|poweroff|halt)\b",
            "Stopping system services",
        ),
        DenyPattern::new(PrivilegeEscalation, r"\bservice\s+\S+\s+stop\b", "Stopping system services"),
        // 원격 코드 실행
        DenyPattern::new(
            RemoteCodeExecution,
            r"\b(curl|wget)\b.*\|\s*(sudo\s+)?((ba|da|k|z)?sh|python[0-9.]*|perl|ruby|node)\b",
            "Download and execute",
        ),
        DenyPattern::new(RemoteCodeExecution, r"\b((ba|z)?sh|source)\s*<\s*\(", "Process substitution execution"),
        DenyPattern::new(RemoteCodeExecution, r"\beval\b.*\$\(\s*(curl|wget)\b", "Evaluating downloaded content"),
        DenyPattern::new(RemoteCodeExecution, r"/dev/(tcp|udp)/", "Reverse shell"),
        DenyPattern::new(
            RemoteCodeExecution,
            r"\bpython[0-9.]*\s+(-\S+\s+)*-c\b.*\bsocket\b",
            "Inline script opening a socket",
        ),
        // 자격 증명 노출
        DenyPattern::new(
            CredentialExposure,
            r"\b(cat|less|more|head|tail|strings|xxd|base64)\s+(-\S+\s+)*/etc/(passwd|shadow|gshadow|sudoers)\b",
            "Reading account databases",
        ),
        DenyPattern::new(
            CredentialExposure,
            r"\b(cat|less|more|head|tail|strings|xxd|base64)\s+(-\S+\s+)*\S*/\.ssh/id_[a-z0-9]+(\s|$)",
            "Reading private SSH keys",
        ),
        DenyPattern::new(CredentialExposure, r"\bssh-keygen\b.*\s-f\b", "SSH key generation"),
        DenyPattern::new(CredentialExposure, r"\b(cp|mv|tee)\b.*\.ssh/authorized_keys", "SSH key installation"),
        DenyPattern::new(CredentialExposure, r">>?\s*\S*\.ssh/authorized_keys", "SSH key installation"),
        DenyPattern::new(CredentialExposure, r"\bhistory\s+-c\b", "History clear"),
        DenyPattern::new(CredentialExposure, r"\bunset\s+histfile\b", "Disabling history logging"),
        DenyPattern::new(CredentialExposure, r"\bcrontab\s+-[er]\b", "Editing or removing cron jobs"),
        // 네트워크 공격 및 스캔
        DenyPattern::new(NetworkAttack, r"\b(nmap|zmap|masscan|hping3)\b", "Network scanning"),
        DenyPattern::new(
            NetworkAttack,
            r"\b(nc|ncat|netcat)\s+(-\S+\s+)*-[a-z]*[le][a-z]*\b",
            "Netcat listener or exec",
        ),
        DenyPattern::new(NetworkAttack, r"\bsocat\b.*\blisten\b", "Socket listening"),
        DenyPattern::new(NetworkAttack, format!(r"{CMD_POS}(john|hashcat|hydra|medusa)\b"), "Password cracking"),
        DenyPattern::new(NetworkAttack, format!(r"{CMD_POS}tcpdump\b"), "Packet capture"),
        DenyPattern::new(NetworkAttack, r"\biptables\b.*\s(-f|--flush)(\s|$)", "Flushing firewall rules"),
        // 패키지 관리
        DenyPattern::new(
            PackageManagement,
            r"\bapt(-get)?\s+(-\S+\s+)*(remove|purge|autoremove)\b",
            "Package removal",
        ),
        DenyPattern::new(PackageManagement, r"\b(yum|dnf|zypper)\s+(-\S+\s+)*(remove|erase)\b", "Package removal"),
        DenyPattern::new(PackageManagement, r"\bpacman\s+-r[a-z]*\b", "Package removal"),
        DenyPattern::new(PackageManagement, r"\bpip[0-9.]*\s+uninstall\b", "Python package removal"),
        DenyPattern::new(
            PackageManagement,
            r"\bnpm\s+(uninstall|remove|rm|un)\b.*\s(-g|--global)\b",
            "Global npm package removal",
        ),
        DenyPattern::new(PackageManagement, r"\bbrew\s+(uninstall|remove|rm)\b", "Package removal"),
        // 정보 수집
        DenyPattern::new(InformationGathering, r"\b(dmidecode|lshw)\b", "Hardware information gathering"),
        DenyPattern::new(InformationGathering, r"/proc/kcore\b", "Kernel memory access"),
    ]
}

// ============================================================
// 컴파일된 집합
// ============================================================

/// 컴파일된 거부 패턴
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub category: DenyCategory,
    pub reason: String,
}

/// 명령어 하나의 검사 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Permitted,
    Rejected {
        category: DenyCategory,
        reason: String,
        pattern: String,
    },
}

impl Verdict {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Verdict::Permitted)
    }
}

/// 순서가 있는 불변 거부 패턴 집합
#[derive(Debug, Clone)]
pub struct DenyPatternSet {
    patterns: Vec<CompiledPattern>,
}

impl DenyPatternSet {
    /// 패턴 컴파일. 잘못된 정규식이 하나라도 있으면 전체 실패
    pub fn new(patterns: Vec<DenyPattern>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let regex = RegexBuilder::new(&p.pattern).case_insensitive(true).build()?;
                Ok(CompiledPattern {
                    regex,
                    category: p.category,
                    reason: p.reason,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// 내장 패턴 뒤에 설정의 추가 패턴
    pub fn with_extra(extra: Vec<DenyPattern>) -> Result<Self> {
        let mut all = builtin_deny_patterns();
        all.extend(extra);
        Self::new(all)
    }

    pub fn builtin() -> Result<Self> {
        Self::new(builtin_deny_patterns())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    /// 정규화된 명령어 검사 (첫 매칭 우선)
    pub fn evaluate(&self, normalized: &str) -> Verdict {
        match self.patterns.iter().find(|p| p.regex.is_match(normalized)) {
            Some(p) => Verdict::Rejected {
                category: p.category,
                reason: p.reason.clone(),
                pattern: p.regex.as_str().to_string(),
            },
            None => Verdict::Permitted,
        }
    }
}
