//! PTY shell session
//!
//! Owns the child shell, its PTY and the output stream. Nothing outside
//! this module writes to or reads from the PTY directly.

use super::error::{Result, SessionError};
use super::stream::PtyStream;
use dock_foundation::{DockConfig, PtySizeConfig, ShellType};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Spawned, prompt not yet installed
    Uninitialized,
    /// Idle at the prompt
    Ready,
    /// A command is in flight
    Busy,
    /// Process exited or was closed
    Closed,
}

/// Everything needed to spawn a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub shell: ShellType,
    pub shell_path: Option<PathBuf>,
    pub pty: PtySizeConfig,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub startup_timeout: Duration,
    pub close_grace: Duration,
}

impl From<&DockConfig> for SessionOptions {
    fn from(config: &DockConfig) -> Self {
        Self {
            shell: config.shell,
            shell_path: config.shell_path.clone(),
            pty: config.pty,
            working_dir: config.working_dir.clone(),
            env: config.env.clone(),
            startup_timeout: config.startup_timeout,
            close_grace: config.close_grace,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&DockConfig::default())
    }
}

// ============================================================================
// Process handle
// ============================================================================

/// The OS process behind a session
pub trait ShellProcess: Send {
    /// `Some(exit_code)` once the process has exited
    fn try_wait(&mut self) -> io::Result<Option<u32>>;

    fn kill(&mut self) -> io::Result<()>;

    fn pid(&self) -> Option<u32> {
        None
    }
}

/// A shell spawned on a portable-pty slave. Holding the master keeps the
/// PTY open.
struct PtyProcess {
    child: Box<dyn Child + Send + Sync>,
    _master: Box<dyn MasterPty + Send>,
}

impl ShellProcess for PtyProcess {
    fn try_wait(&mut self) -> io::Result<Option<u32>> {
        Ok(self.child.try_wait()?.map(|status| status.exit_code()))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }
}

// ============================================================================
// ShellSession
// ============================================================================

/// One persistent interactive shell
pub struct ShellSession {
    pub(super) id: String,
    pub(super) shell: ShellType,
    pub(super) token: String,
    pub(super) state: SessionState,
    pub(super) stream: PtyStream,
    pub(super) writer: Box<dyn Write + Send>,
    pub(super) process: Box<dyn ShellProcess>,
    /// A timed-out command's prompt is still pending in the stream
    pub(super) needs_flush: bool,
    /// Calls turned away while that command was still running
    pub(super) busy_strikes: u8,
    close_grace: Duration,
    terminated: bool,
}

impl ShellSession {
    /// Spawn the shell and install the prompt token
    pub async fn open(options: &SessionOptions) -> Result<Self> {
        let mut session = Self::spawn(options)?;
        if let Err(e) = session.synchronize(options.startup_timeout).await {
            warn!("Session {} failed to synchronize: {}", session.id, e);
            session.close().await;
            return Err(e);
        }
        info!(
            "Shell session {} ready ({}, pid {:?})",
            session.id,
            session.shell,
            session.process.pid()
        );
        Ok(session)
    }

    /// Spawn the shell on a fresh PTY; the session is left Uninitialized
    pub fn spawn(options: &SessionOptions) -> Result<Self> {
        let executable = options
            .shell
            .resolve_executable(options.shell_path.as_deref())
            .map_err(|e| SessionError::SpawnError(e.to_string()))?;

        let pty_system = native_pty_system();
        let size = PtySize {
            rows: options.pty.rows,
            cols: options.pty.cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        let pair = pty_system
            .openpty(size)
            .map_err(|e| SessionError::SpawnError(format!("Failed to open PTY: {}", e)))?;

        let mut cmd = CommandBuilder::new(&executable);
        cmd.args(options.shell.interactive_args());
        if let Some(dir) = &options.working_dir {
            cmd.cwd(dir);
        }
        for (key, value) in options.shell.session_env() {
            cmd.env(key, value);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }
        cmd.env_remove("PROMPT_COMMAND");

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            SessionError::SpawnError(format!("Failed to spawn {}: {}", executable.display(), e))
        })?;
        // Only the child keeps the slave open, so its exit shows up as EOF
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::SpawnError(format!("Failed to clone PTY reader: {}", e)))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::SpawnError(format!("Failed to take PTY writer: {}", e)))?;
        let stream = PtyStream::spawn_reader(reader)?;

        debug!("Spawned {} on PTY {}x{}", executable.display(), size.cols, size.rows);

        let process = PtyProcess {
            child,
            _master: pair.master,
        };
        Ok(Self::from_parts(
            options.shell,
            stream,
            writer,
            Box::new(process),
            options.close_grace,
        ))
    }

    /// Assemble a session from already-connected parts
    pub fn from_parts(
        shell: ShellType,
        stream: PtyStream,
        writer: Box<dyn Write + Send>,
        process: Box<dyn ShellProcess>,
        close_grace: Duration,
    ) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            token: format!("__SHDK_{}__", id),
            id: id[..8].to_string(),
            shell,
            state: SessionState::Uninitialized,
            stream,
            writer,
            process,
            needs_flush: false,
            busy_strikes: 0,
            close_grace,
            terminated: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn shell(&self) -> ShellType {
        self.shell
    }

    /// Whether the shell process is still running
    pub fn is_alive(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        match self.process.try_wait() {
            Ok(None) => true,
            Ok(Some(code)) => {
                info!("Shell session {} exited with code {}", self.id, code);
                self.mark_closed();
                false
            }
            Err(e) => {
                warn!("Cannot query shell session {}: {}", self.id, e);
                self.mark_closed();
                false
            }
        }
    }

    /// Ready and still running
    pub fn is_reusable(&mut self) -> bool {
        self.state == SessionState::Ready && self.is_alive()
    }

    /// Terminate the shell: ask it to exit, wait out the grace period,
    /// then kill. Calling it again is a no-op.
    pub async fn close(&mut self) {
        if self.terminated {
            return;
        }
        self.state = SessionState::Closed;

        if let Err(e) = self.send_line("exit") {
            debug!("Could not send exit to session {}: {}", self.id, e);
        }

        let deadline = Instant::now() + self.close_grace;
        loop {
            match self.process.try_wait() {
                Ok(Some(code)) => {
                    debug!("Session {} exited with code {}", self.id, code);
                    break;
                }
                Ok(None) if Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                _ => {
                    if let Err(e) = self.process.kill() {
                        warn!("Failed to kill session {}: {}", self.id, e);
                    }
                    break;
                }
            }
        }

        self.terminated = true;
        info!("Shell session {} closed", self.id);
    }

    pub(super) fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Write one line followed by a newline
    pub(super) fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.send_raw(b"\n")
    }

    /// Write bytes as typed, e.g. a control character
    pub(super) fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        if !self.terminated {
            if let Err(e) = self.process.kill() {
                debug!("Kill on drop for session {} failed: {}", self.id, e);
            }
        }
    }
}
