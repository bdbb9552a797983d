//! Tool Context - 도구 실행 컨텍스트
//!
//! `RuntimeContext`는 공유 세션 supervisor와 안전 필터 위에서
//! Layer1 `ToolContext` trait를 구현합니다.
//!
//! ```ignore
//! let supervisor = Arc::new(SessionSupervisor::with_options(options));
//! let ctx = RuntimeContext::new(supervisor, SafetyFilter::builtin()?, config.timeouts);
//! let result = tool.execute(input, &ctx).await?;
//! ```

use crate::filter::SafetyFilter;
use crate::session::SessionSupervisor;
use async_trait::async_trait;
use dock_foundation::{CommandRequest, CommandResult, Result, TimeoutBounds, ToolContext, Verdict};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub struct RuntimeContext {
    supervisor: Arc<SessionSupervisor>,
    filter: SafetyFilter,
    timeouts: TimeoutBounds,
}

impl RuntimeContext {
    pub fn new(
        supervisor: Arc<SessionSupervisor>,
        filter: SafetyFilter,
        timeouts: TimeoutBounds,
    ) -> Self {
        Self {
            supervisor,
            filter,
            timeouts,
        }
    }

    pub fn supervisor(&self) -> &Arc<SessionSupervisor> {
        &self.supervisor
    }

    pub fn filter(&self) -> &SafetyFilter {
        &self.filter
    }
}

#[async_trait]
impl ToolContext for RuntimeContext {
    fn check_command(&self, command: &str) -> Verdict {
        self.filter.check(command)
    }

    fn timeout_bounds(&self) -> TimeoutBounds {
        self.timeouts
    }

    async fn run_command(&self, request: CommandRequest) -> Result<CommandResult> {
        Ok(self.supervisor.run(&request).await?)
    }

    async fn working_dir(&self) -> PathBuf {
        if let Some(dir) = self.supervisor.working_dir().await {
            return dir;
        }
        let fallback = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        debug!("Using process directory {} as working directory", fallback.display());
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{FakeShell, Reply};
    use std::time::Duration;

    fn context(fake: FakeShell) -> RuntimeContext {
        RuntimeContext::new(
            Arc::new(SessionSupervisor::new(Arc::new(fake))),
            SafetyFilter::builtin().unwrap(),
            TimeoutBounds::default(),
        )
    }

    #[tokio::test]
    async fn test_working_dir_from_shell() {
        let ctx = context(FakeShell::new(|_| Reply::output("/srv/app\n")));
        assert_eq!(ctx.working_dir().await, PathBuf::from("/srv/app"));
    }

    #[tokio::test]
    async fn test_working_dir_falls_back_to_process_dir() {
        let ctx = context(FakeShell::new(|_| Reply::output("not a path\n")));
        assert_eq!(ctx.working_dir().await, std::env::current_dir().unwrap());
    }

    #[tokio::test]
    async fn test_run_command_goes_through_supervisor() {
        let ctx = context(FakeShell::new(|_| Reply::output("hi\n")));
        let result = ctx
            .run_command(CommandRequest::new("echo hi", Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(result.output, "hi");
    }
}
