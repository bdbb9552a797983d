//! Session supervisor - owns the single shell session
//!
//! The slot mutex is the execution slot: one command at a time, in
//! arrival order. A session that died or was left Busy by a cancelled
//! caller is replaced on the next use. So is one that stopped answering
//! even Ctrl-C; the command that found it that way runs on the new shell.

use super::error::{Result, SessionError};
use super::shell::{SessionOptions, SessionState, ShellSession};
use async_trait::async_trait;
use dock_foundation::{CommandRequest, CommandResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Bound on the `pwd` query behind [`SessionSupervisor::working_dir`]
pub const WORKING_DIR_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Attached to a result that ran on a freshly restarted shell
pub const SESSION_RESET_NOTICE: &str = "[the previous command never returned to the prompt, \
     so the shell was restarted; working directory and environment were reset]";

/// Creates ready-to-use sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<ShellSession>;
}

/// Launches real shells on a PTY
pub struct PtyLauncher {
    options: SessionOptions,
}

impl PtyLauncher {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionLauncher for PtyLauncher {
    async fn launch(&self) -> Result<ShellSession> {
        ShellSession::open(&self.options).await
    }
}

pub struct SessionSupervisor {
    launcher: Arc<dyn SessionLauncher>,
    slot: Mutex<Option<ShellSession>>,
}

impl SessionSupervisor {
    pub fn new(launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            launcher,
            slot: Mutex::new(None),
        }
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self::new(Arc::new(PtyLauncher::new(options)))
    }

    /// Open the session now instead of on the first command
    pub async fn open_eagerly(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let session = self.ensure_open(&mut slot).await?;
        debug!("Session {} ({}) opened eagerly", session.id(), session.shell());
        Ok(())
    }

    /// Run one command, serialized with every other caller
    pub async fn run(&self, request: &CommandRequest) -> Result<CommandResult> {
        let mut slot = self.slot.lock().await;
        let session = self.ensure_open(&mut slot).await?;
        match run_on(session, request).await {
            Err(SessionError::Unresponsive) => {
                warn!("Shell session stopped responding; restarting it");
                let session = self.ensure_open(&mut slot).await?;
                Ok(run_on(session, request)
                    .await?
                    .with_notice(SESSION_RESET_NOTICE))
            }
            other => other,
        }
    }

    /// The shell's current directory, via `pwd`
    pub async fn working_dir(&self) -> Option<PathBuf> {
        let request = CommandRequest::new("pwd", WORKING_DIR_QUERY_TIMEOUT);
        match self.run(&request).await {
            Ok(result) if result.is_completed() => parse_pwd(&result.output),
            Ok(result) => {
                debug!("Working directory query ended as {:?}", result.outcome);
                None
            }
            Err(e) => {
                warn!("Working directory query failed: {}", e);
                None
            }
        }
    }

    /// State of the current session, if one exists
    pub async fn state(&self) -> Option<SessionState> {
        self.slot.lock().await.as_ref().map(ShellSession::state)
    }

    /// Close the session. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(mut session) = slot.take() {
            session.close().await;
        }
    }

    async fn ensure_open<'a>(
        &self,
        slot: &'a mut Option<ShellSession>,
    ) -> Result<&'a mut ShellSession> {
        if let Some(mut session) = slot.take() {
            if session.is_reusable() {
                return Ok(slot.insert(session));
            }
            info!(
                "Replacing shell session {} (state {:?})",
                session.id(),
                session.state()
            );
            session.close().await;
        }
        let session = self.open_with_retry().await?;
        Ok(slot.insert(session))
    }

    async fn open_with_retry(&self) -> Result<ShellSession> {
        match self.launcher.launch().await {
            Err(e) if e.is_recoverable() => {
                warn!("Shell session failed to start ({}); retrying once", e);
                self.launcher.launch().await
            }
            other => other,
        }
    }
}

async fn run_on(session: &mut ShellSession, request: &CommandRequest) -> Result<CommandResult> {
    match session.execute(request).await {
        Err(SessionError::SessionClosed) => Ok(CommandResult::session_closed(String::new())),
        other => other,
    }
}

/// Last non-empty line, when it is an absolute path
fn parse_pwd(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{FakeShell, Reply};
    use dock_foundation::CommandOutcome;
    use std::sync::Mutex as StdMutex;

    fn request(command: &str) -> CommandRequest {
        CommandRequest::new(command, Duration::from_secs(2))
    }

    /// Tracks `cd` so `pwd` reflects earlier commands
    fn cwd_shell() -> FakeShell {
        let cwd = Arc::new(StdMutex::new("/home/dev/project".to_string()));
        FakeShell::new(move |line| {
            let mut cwd = cwd.lock().unwrap();
            if let Some(dir) = line.strip_prefix("cd ") {
                if dir == ".." {
                    let parent = cwd.rsplit_once('/').map(|(p, _)| p.to_string());
                    *cwd = parent.filter(|p| !p.is_empty()).unwrap_or_else(|| "/".into());
                } else {
                    *cwd = dir.to_string();
                }
                Reply::output("")
            } else if line == "pwd" {
                Reply::output(format!("{}\n", cwd))
            } else {
                Reply::output(format!("ran {line}\n"))
            }
        })
    }

    #[tokio::test]
    async fn test_lazy_open_and_reuse() {
        let fake = cwd_shell();
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));
        assert_eq!(supervisor.state().await, None);

        let first = supervisor.run(&request("one")).await.unwrap();
        let second = supervisor.run(&request("two")).await.unwrap();
        assert_eq!(first.output, "ran one");
        assert_eq!(second.output, "ran two");
        assert_eq!(fake.launches(), 1);
        assert_eq!(supervisor.state().await, Some(SessionState::Ready));
    }

    #[tokio::test]
    async fn test_working_dir_follows_cd() {
        let supervisor = SessionSupervisor::new(Arc::new(cwd_shell()));
        assert_eq!(
            supervisor.working_dir().await,
            Some(PathBuf::from("/home/dev/project"))
        );
        supervisor.run(&request("cd ..")).await.unwrap();
        assert_eq!(supervisor.working_dir().await, Some(PathBuf::from("/home/dev")));
    }

    #[tokio::test]
    async fn test_closed_session_is_recreated() {
        let fake = FakeShell::new(|line| match line {
            "exit 1" => Reply::Exit,
            _ => Reply::output("ok\n"),
        });
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));

        let result = supervisor.run(&request("exit 1")).await.unwrap();
        assert_eq!(result.outcome, CommandOutcome::SessionClosed);

        let result = supervisor.run(&request("echo ok")).await.unwrap();
        assert!(result.is_completed());
        assert_eq!(result.output, "ok");
        assert_eq!(fake.launches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_serialized() {
        let fake = cwd_shell();
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));

        let (req_a, req_b, req_c) = (request("A"), request("B"), request("C"));
        let (a, b, c) = tokio::join!(
            supervisor.run(&req_a),
            supervisor.run(&req_b),
            supervisor.run(&req_c),
        );
        assert_eq!(a.unwrap().output, "ran A");
        assert_eq!(b.unwrap().output, "ran B");
        assert_eq!(c.unwrap().output, "ran C");
        assert_eq!(fake.launches(), 1);
        assert_eq!(fake.lines_written(), 3);
    }

    #[tokio::test]
    async fn test_unresponsive_shell_is_restarted() {
        let fake = FakeShell::new(|line| match line {
            "sleep 1000" => Reply::hang(""),
            _ => Reply::output(format!("ran {line}\n")),
        });
        fake.ignore_interrupts();
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));
        let short = |command: &str| CommandRequest::new(command, Duration::from_millis(200));

        let hung = supervisor.run(&short("sleep 1000")).await.unwrap();
        assert!(hung.is_timed_out());
        let busy = supervisor.run(&short("echo x")).await.unwrap();
        assert_eq!(busy.output, crate::session::STILL_BUSY_NOTICE);

        let result = supervisor.run(&request("echo x")).await.unwrap();
        assert!(result.is_completed());
        assert_eq!(result.output, "ran echo x");
        assert_eq!(result.notice.as_deref(), Some(SESSION_RESET_NOTICE));
        assert_eq!(fake.launches(), 2);
        assert_eq!(fake.interrupts(), 1);

        let result = supervisor.run(&request("echo y")).await.unwrap();
        assert_eq!(result.output, "ran echo y");
        assert_eq!(result.notice, None);
    }

    #[tokio::test]
    async fn test_startup_failure_retried_once() {
        let fake = cwd_shell();
        fake.fail_next_launches(1);
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));
        supervisor.open_eagerly().await.unwrap();
        assert_eq!(fake.launches(), 2);
    }

    #[tokio::test]
    async fn test_startup_failure_twice_is_error() {
        let fake = cwd_shell();
        fake.fail_next_launches(2);
        let supervisor = SessionSupervisor::new(Arc::new(fake.clone()));
        let err = supervisor.run(&request("ls")).await.unwrap_err();
        assert!(matches!(err, SessionError::StartupTimeout(_)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let supervisor = SessionSupervisor::new(Arc::new(cwd_shell()));
        supervisor.open_eagerly().await.unwrap();
        supervisor.shutdown().await;
        supervisor.shutdown().await;
        assert_eq!(supervisor.state().await, None);
    }

    #[test]
    fn test_parse_pwd() {
        assert_eq!(parse_pwd("/tmp\n"), Some(PathBuf::from("/tmp")));
        assert_eq!(parse_pwd("noise\n/var/log\n\n"), Some(PathBuf::from("/var/log")));
        assert_eq!(parse_pwd("relative/dir"), None);
        assert_eq!(parse_pwd(""), None);
    }
}
