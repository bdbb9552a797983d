//! Prompt synchronization
//!
//! Runs once right after spawn: installs the session token as the prompt,
//! then drains every copy of it (and the startup banner) until the stream
//! goes quiet.

use super::error::{Result, SessionError};
use super::shell::{SessionState, ShellSession};
use super::stream::Expect;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// No new prompt for this long means the stream is settled
pub const PROMPT_QUIET_WINDOW: Duration = Duration::from_millis(250);

impl ShellSession {
    /// Uninitialized -> Ready, or `StartupTimeout` if the token never shows
    pub async fn synchronize(&mut self, startup_timeout: Duration) -> Result<()> {
        let statement = self.shell.prompt_statement(&self.token);
        self.send_line(&statement)?;

        let deadline = Instant::now() + startup_timeout;
        let token = self.token.clone();

        match self.stream.expect_exact(token.as_bytes(), deadline).await {
            Expect::Matched { before, .. } => {
                debug!(
                    "Session {} saw prompt token after {} banner bytes",
                    self.id,
                    before.len()
                );
            }
            Expect::Timeout => {
                warn!(
                    "Session {} prompt token not seen within {:?}",
                    self.id, startup_timeout
                );
                return Err(SessionError::StartupTimeout(startup_timeout.as_secs()));
            }
            Expect::Eof => {
                self.mark_closed();
                return Err(SessionError::SpawnError(
                    "shell exited during startup".to_string(),
                ));
            }
        }

        // Extra prompts (e.g. one per line of a multi-line banner) until quiet
        let mut extra = 0usize;
        loop {
            let window = (Instant::now() + PROMPT_QUIET_WINDOW).min(deadline);
            match self.stream.expect_exact(token.as_bytes(), window).await {
                Expect::Matched { .. } => extra += 1,
                Expect::Timeout => break,
                Expect::Eof => {
                    self.mark_closed();
                    return Err(SessionError::SessionClosed);
                }
            }
        }
        let leftover = self.stream.take_buffer();
        debug!(
            "Session {} synchronized ({} extra prompts, {} stray bytes dropped)",
            self.id,
            extra,
            leftover.len()
        );

        self.needs_flush = false;
        self.busy_strikes = 0;
        self.state = SessionState::Ready;
        Ok(())
    }
}
