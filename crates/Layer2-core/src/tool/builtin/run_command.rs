//! run-command - 영속 셸에서 명령어 한 줄 실행
//!
//! 필터 먼저, 그 다음 세션. 모든 결과는 텍스트로 보고되며
//! 거부나 타임아웃도 오류(Err)로 올라가지 않습니다.

use async_trait::async_trait;
use dock_foundation::{
    CommandOutcome, CommandRequest, CommandResult, Result, Tool, ToolContext, ToolMeta,
    ToolResult, Verdict,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::parse_input;

/// run-command 입력
#[derive(Debug, Default, Deserialize)]
pub struct RunCommandInput {
    /// 실행할 명령어 (`bash_command`는 예전 이름)
    #[serde(default, alias = "bash_command")]
    pub command: Option<String>,

    /// 초 단위. 숫자가 아니면 기본값
    #[serde(default)]
    pub timeout: Option<Value>,
}

pub struct RunCommandTool;

impl RunCommandTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "run-command";

    fn format_result(command: &str, result: CommandResult) -> ToolResult {
        let CommandResult {
            output,
            outcome,
            notice,
        } = result;
        let mut formatted = match outcome {
            CommandOutcome::Completed => {
                ToolResult::text(output).with_metadata("outcome", json!("completed"))
            }
            CommandOutcome::TimedOut { after_secs } => {
                let timed_out =
                    format!("[command timed out after {after_secs}s; the session is still usable]");
                ToolResult::error(with_partial(&output, &timed_out))
                    .with_metadata("outcome", json!("timed_out"))
            }
            CommandOutcome::SessionClosed => ToolResult::error(with_partial(
                &output,
                "Error: the shell session ended unexpectedly; a new session will be started on the next call.",
            ))
            .with_metadata("outcome", json!("session_closed")),
            CommandOutcome::Rejected { category, reason } => ToolResult::error(format!(
                "Error: '{}' was rejected by the safety filter ({}: {}).",
                command, category, reason
            ))
            .with_metadata("outcome", json!("rejected")),
        };

        // 이전 명령에 관한 안내이므로 맨 앞에
        if let Some(notice) = notice {
            formatted.output = with_partial(&notice, &formatted.output);
        }
        formatted
    }
}

impl Default for RunCommandTool {
    fn default() -> Self {
        Self::new()
    }
}

fn with_partial(output: &str, notice: &str) -> String {
    match (output.is_empty(), notice.is_empty()) {
        (true, _) => notice.to_string(),
        (false, true) => output.to_string(),
        (false, false) => format!("{output}\n{notice}"),
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Run Command")
            .description(
                "Runs a command in a persistent interactive shell session. State such as the \
                 working directory and environment variables carries over between calls.",
            )
            .category("execute")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The complete command line to run in the shell session."
                },
                "timeout": {
                    "type": "number",
                    "description": "Optional timeout in seconds (default: 10)",
                    "default": 10,
                    "minimum": 1,
                    "maximum": 60
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: RunCommandInput = parse_input(input)?;

        let Some(command) = parsed.command.filter(|c| !c.trim().is_empty()) else {
            return Ok(ToolResult::error("Error: 'command' argument is required."));
        };

        if let Verdict::Rejected {
            category, reason, ..
        } = context.check_command(&command)
        {
            return Ok(Self::format_result(
                &command,
                CommandResult::rejected(category, reason),
            ));
        }

        let timeout = context
            .timeout_bounds()
            .resolve(parsed.timeout.as_ref().and_then(Value::as_f64));
        let request = CommandRequest::new(command.clone(), timeout);

        // 줄마다 프롬프트가 따로 돌아옴
        if request.single_line().is_none() {
            return Ok(ToolResult::error(
                "Error: 'command' must be a single line; join multiple statements with ';' or '&&'.",
            )
            .with_metadata("outcome", json!("invalid")));
        }
        debug!("run-command with timeout {:?}", timeout);

        match context.run_command(request).await {
            Ok(result) => Ok(Self::format_result(&command, result)),
            Err(e) => Ok(ToolResult::error(format!(
                "Error: could not start shell session: {}",
                e
            ))
            .with_metadata("outcome", json!("spawn_failed"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SafetyFilter;
    use crate::session::testing::{FakeShell, Reply};
    use crate::session::SessionSupervisor;
    use crate::tool::RuntimeContext;
    use dock_foundation::TimeoutBounds;
    use std::sync::Arc;

    fn context(fake: FakeShell) -> RuntimeContext {
        RuntimeContext::new(
            Arc::new(SessionSupervisor::new(Arc::new(fake))),
            SafetyFilter::builtin().unwrap(),
            TimeoutBounds::default(),
        )
    }

    fn echo_shell() -> FakeShell {
        FakeShell::new(|line| match line.strip_prefix("echo ") {
            Some(rest) => Reply::output(format!("{rest}\n")),
            None if line.starts_with("sleep") => Reply::hang(""),
            None => Reply::output(""),
        })
    }

    #[tokio::test]
    async fn test_runs_command() {
        let ctx = context(echo_shell());
        let result = RunCommandTool::new()
            .execute(json!({"command": "echo hello"}), &ctx)
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn test_accepts_legacy_argument_name() {
        let ctx = context(echo_shell());
        let result = RunCommandTool::new()
            .execute(json!({"bash_command": "echo legacy"}), &ctx)
            .await
            .unwrap();
        assert_eq!(result.output, "legacy");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let fake = echo_shell();
        let ctx = context(fake.clone());
        for input in [json!({}), json!({"command": ""}), Value::Null] {
            let result = RunCommandTool::new().execute(input, &ctx).await.unwrap();
            assert!(result.is_error);
            assert_eq!(result.output, "Error: 'command' argument is required.");
        }
        assert_eq!(fake.launches(), 0);
    }

    #[tokio::test]
    async fn test_rejected_command_never_reaches_shell() {
        let fake = echo_shell();
        let ctx = context(fake.clone());
        let result = RunCommandTool::new()
            .execute(json!({"command": "rm -rf /"}), &ctx)
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result
            .output
            .starts_with("Error: 'rm -rf /' was rejected by the safety filter ("));
        assert_eq!(result.metadata.get("outcome"), Some(&json!("rejected")));
        assert_eq!(fake.launches(), 0);
        assert_eq!(fake.lines_written(), 0);
    }

    #[tokio::test]
    async fn test_multi_line_command_is_refused() {
        let fake = echo_shell();
        let ctx = context(fake.clone());
        let result = RunCommandTool::new()
            .execute(json!({"command": "echo one\necho two"}), &ctx)
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(
            result.output,
            "Error: 'command' must be a single line; join multiple statements with ';' or '&&'."
        );
        assert_eq!(result.metadata.get("outcome"), Some(&json!("invalid")));
        assert_eq!(fake.lines_written(), 0);

        let result = RunCommandTool::new()
            .execute(json!({"command": "echo one; echo two\n"}), &ctx)
            .await
            .unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_timeout_is_text_and_clamped() {
        let ctx = context(echo_shell());
        let started = std::time::Instant::now();
        // 0 clamps up to the 1s minimum
        let result = RunCommandTool::new()
            .execute(json!({"command": "sleep 30", "timeout": 0}), &ctx)
            .await
            .unwrap();
        let elapsed = started.elapsed();
        assert!(result.is_error);
        assert_eq!(
            result.output,
            "[command timed out after 1s; the session is still usable]"
        );
        assert!(elapsed >= std::time::Duration::from_millis(900));
        assert!(elapsed < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_session_closed_text() {
        let ctx = context(FakeShell::new(|_| Reply::Exit));
        let result = RunCommandTool::new()
            .execute(json!({"command": "exit"}), &ctx)
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("the shell session ended unexpectedly"));
    }

    #[tokio::test]
    async fn test_startup_failure_text() {
        let fake = echo_shell();
        fake.fail_next_launches(2);
        let ctx = context(fake);
        let result = RunCommandTool::new()
            .execute(json!({"command": "ls"}), &ctx)
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result
            .output
            .starts_with("Error: could not start shell session: "));
    }

    #[test]
    fn test_session_notice_comes_first() {
        let result = RunCommandTool::format_result(
            "echo next",
            CommandResult::completed("next").with_notice("[restarted]"),
        );
        assert!(!result.is_error);
        assert_eq!(result.output, "[restarted]\nnext");

        let result = RunCommandTool::format_result(
            "true",
            CommandResult::completed("").with_notice("[restarted]"),
        );
        assert_eq!(result.output, "[restarted]");
    }

    #[test]
    fn test_partial_output_precedes_notice() {
        let result = RunCommandTool::format_result(
            "make",
            CommandResult::timed_out("building...", std::time::Duration::from_secs(3)),
        );
        assert_eq!(
            result.output,
            "building...\n[command timed out after 3s; the session is still usable]"
        );
    }
}
