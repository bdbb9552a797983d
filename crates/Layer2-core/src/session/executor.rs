//! Command executor - the request/response state machine
//!
//! ```text
//! Idle -> Sending -> AwaitingEcho -> AwaitingPrompt -> Done
//!                         |               |
//!                         +---------------+--> TimedOut | Closed
//! ```
//!
//! One deadline covers the whole call. A missing echo is tolerated (some
//! shells suppress it). A missing prompt yields `TimedOut` and leaves the
//! session usable; the stale prompt is consumed before the next command.
//!
//! A command that never returns to the prompt is handled in steps: the
//! next call is turned away, the one after interrupts it with Ctrl-C, and
//! if the shell still does not answer the session is given up as
//! `Unresponsive` so the supervisor replaces it.

use super::error::{Result, SessionError};
use super::prompt::PROMPT_QUIET_WINDOW;
use super::shell::{SessionState, ShellSession};
use super::stream::{Expect, Pattern};
use dock_foundation::{CommandRequest, CommandResult};
use regex::bytes::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Upper bound on waiting for the echo before moving on without it
pub const ECHO_WAIT: Duration = Duration::from_secs(2);

/// How long an interrupted command gets to give the prompt back
pub const INTERRUPT_WAIT: Duration = Duration::from_secs(2);

/// Text returned when a previous timed-out command still holds the shell
pub const STILL_BUSY_NOTICE: &str = "[the previous command is still running; this command was not sent. \
     The next call will interrupt it]";

/// Attached to the first result after a stuck command was interrupted
pub const INTERRUPTED_NOTICE: &str =
    "[the previous command was still running and was interrupted before this command ran]";

/// Ctrl-C as typed on the terminal
const INTERRUPT: &[u8] = b"\x03";

/// Optional gap the terminal may insert where a long line wraps
const WRAP_GAP: &str = r"(?:\x20?\r\n?)?";

/// CSI, OSC and two-byte ESC sequences. Every other byte, tabs included,
/// is output.
const ESCAPE_SEQUENCE: &str = r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[@-_])";

#[derive(Debug)]
enum Phase {
    Idle,
    Sending,
    AwaitingEcho,
    AwaitingPrompt,
    Done(Vec<u8>),
    TimedOut(Vec<u8>),
    Closed(Vec<u8>),
}

/// Result of consuming a stale prompt
#[derive(Debug, PartialEq, Eq)]
enum Settle {
    Clean,
    /// Clean, but only after Ctrl-C
    Interrupted,
    StillBusy,
    Closed,
}

impl ShellSession {
    /// Run one command and capture its output
    pub async fn execute(&mut self, request: &CommandRequest) -> Result<CommandResult> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Busy => return Err(SessionError::SessionBusy),
            SessionState::Closed | SessionState::Uninitialized => {
                return Err(SessionError::SessionClosed)
            }
        }

        // One prompt per line sent; only a single line keeps the framing exact
        let Some(line) = request.single_line() else {
            return Err(SessionError::InvalidCommand(
                "the command spans several lines".to_string(),
            ));
        };

        let deadline = Instant::now() + request.timeout;
        self.state = SessionState::Busy;
        debug!("Session {} executing: {}", self.id, line);

        let mut notice = None;
        if self.needs_flush {
            let settled = if self.busy_strikes == 0 {
                self.settle(deadline).await
            } else {
                self.interrupt(deadline).await
            };
            match settled {
                Settle::Clean => self.busy_strikes = 0,
                Settle::Interrupted => {
                    self.busy_strikes = 0;
                    notice = Some(INTERRUPTED_NOTICE);
                }
                Settle::StillBusy if self.busy_strikes == 0 => {
                    self.busy_strikes = 1;
                    self.state = SessionState::Ready;
                    warn!("Session {} still busy; not sending {:?}", self.id, line);
                    return Ok(CommandResult::timed_out(STILL_BUSY_NOTICE, request.timeout));
                }
                Settle::StillBusy => {
                    self.mark_closed();
                    warn!("Session {} ignored the interrupt", self.id);
                    return Err(SessionError::Unresponsive);
                }
                Settle::Closed => {
                    self.mark_closed();
                    return Ok(CommandResult::session_closed(String::new()));
                }
            }
        }

        let token = self.token.clone();
        let echo = echo_pattern(line);
        let mut phase = Phase::Idle;

        let result = loop {
            phase = match phase {
                Phase::Idle => Phase::Sending,

                Phase::Sending => match self.send_line(line) {
                    Ok(()) => Phase::AwaitingEcho,
                    Err(e) => {
                        warn!("Session {} write failed: {}", self.id, e);
                        Phase::Closed(Vec::new())
                    }
                },

                Phase::AwaitingEcho => match echo.as_ref() {
                    None => Phase::AwaitingPrompt,
                    Some(echo) => {
                        let window = (Instant::now() + ECHO_WAIT).min(deadline);
                        let patterns = [Pattern::Regex(echo), Pattern::Exact(token.as_bytes())];
                        match self.stream.expect_any(&patterns, window).await {
                            // Prompt arrived first: no echo, output is everything before it
                            Expect::Matched { index: 1, before } => Phase::Done(before),
                            Expect::Matched { .. } => Phase::AwaitingPrompt,
                            Expect::Timeout => {
                                debug!("Session {} saw no echo; waiting for prompt", self.id);
                                Phase::AwaitingPrompt
                            }
                            Expect::Eof => Phase::Closed(self.stream.take_buffer()),
                        }
                    }
                },

                Phase::AwaitingPrompt => {
                    match self.stream.expect_exact(token.as_bytes(), deadline).await {
                        Expect::Matched { before, .. } => Phase::Done(before),
                        Expect::Timeout => Phase::TimedOut(self.stream.take_buffer()),
                        Expect::Eof => Phase::Closed(self.stream.take_buffer()),
                    }
                }

                Phase::Done(raw) => {
                    self.state = SessionState::Ready;
                    break CommandResult::completed(extract_output(&raw, line));
                }

                Phase::TimedOut(partial) => {
                    self.state = SessionState::Ready;
                    self.needs_flush = true;
                    self.busy_strikes = 0;
                    info!(
                        "Session {} timed out after {:?}: {}",
                        self.id, request.timeout, line
                    );
                    break CommandResult::timed_out(
                        extract_output(&partial, line),
                        request.timeout,
                    );
                }

                Phase::Closed(partial) => {
                    self.mark_closed();
                    warn!("Session {} reached end of stream", self.id);
                    break CommandResult::session_closed(extract_output(&partial, line));
                }
            };
        };

        Ok(match notice {
            Some(notice) => result.with_notice(notice),
            None => result,
        })
    }

    /// Consume through the pending prompt of a timed-out command
    async fn settle(&mut self, deadline: Instant) -> Settle {
        let token = self.token.clone();
        match self.stream.expect_exact(token.as_bytes(), deadline).await {
            Expect::Matched { before, .. } => {
                debug!(
                    "Session {} discarded {} bytes of late output",
                    self.id,
                    before.len()
                );
                self.stream.take_buffer();
                self.needs_flush = false;
                Settle::Clean
            }
            Expect::Timeout => Settle::StillBusy,
            Expect::Eof => Settle::Closed,
        }
    }

    /// Ctrl-C the stuck command, unless it has finished in the meantime
    async fn interrupt(&mut self, deadline: Instant) -> Settle {
        let quick = (Instant::now() + PROMPT_QUIET_WINDOW).min(deadline);
        match self.settle(quick).await {
            Settle::StillBusy => {}
            other => return other,
        }

        info!("Session {} interrupting the previous command", self.id);
        if let Err(e) = self.send_raw(INTERRUPT) {
            warn!("Session {} interrupt write failed: {}", self.id, e);
            return Settle::Closed;
        }

        let window = (Instant::now() + INTERRUPT_WAIT).min(deadline);
        match self.settle(window).await {
            Settle::Clean => {
                // A prompt that raced the interrupt
                let dropped = self.stream.drain_quiet(PROMPT_QUIET_WINDOW, deadline).await;
                if dropped > 0 {
                    debug!("Session {} dropped {} bytes after interrupt", self.id, dropped);
                }
                if self.stream.is_eof() {
                    return Settle::Closed;
                }
                Settle::Interrupted
            }
            other => other,
        }
    }
}

// ============================================================================
// Framing helpers
// ============================================================================

/// Regex matching the terminal's echo of `command` plus its line end.
///
/// Tolerates a wrap sequence between any two characters. `None` when the
/// command is too large to compile, in which case the echo wait is skipped.
pub(crate) fn echo_pattern(command: &str) -> Option<Regex> {
    let mut pattern = String::with_capacity(command.len() * 4);
    let mut buf = [0u8; 4];
    for (i, ch) in command.chars().enumerate() {
        if i > 0 {
            pattern.push_str(WRAP_GAP);
        }
        pattern.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
    }
    pattern.push_str(r"\r?\n");

    match RegexBuilder::new(&pattern).build() {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Echo pattern unavailable: {}", e);
            None
        }
    }
}

fn escape_sequences() -> Option<&'static Regex> {
    static ESCAPES: OnceLock<Option<Regex>> = OnceLock::new();
    ESCAPES
        .get_or_init(|| Regex::new(ESCAPE_SEQUENCE).ok())
        .as_ref()
}

/// Decode PTY bytes: drop terminal escape sequences and carriage returns
pub(crate) fn clean_output(raw: &[u8]) -> String {
    let stripped = match escape_sequences() {
        Some(re) => re.replace_all(raw, &b""[..]),
        None => Cow::Borrowed(raw),
    };
    String::from_utf8_lossy(&stripped).replace('\r', "")
}

/// Raw bytes between echo and prompt -> reported output
pub(crate) fn extract_output(raw: &[u8], command: &str) -> String {
    let text = clean_output(raw);
    strip_residual_echo(&text, command)
        .trim_end_matches('\n')
        .to_string()
}

/// Drop a duplicate echo, but only when it is the very first line.
/// A copy of the command text anywhere else is genuine output.
pub(crate) fn strip_residual_echo<'a>(text: &'a str, command: &str) -> &'a str {
    let command = command.trim_end_matches('\n');
    if command.is_empty() {
        return text;
    }
    match text.strip_prefix(command) {
        Some(rest) => rest.strip_prefix('\n').unwrap_or(text),
        None => text,
    }
}
