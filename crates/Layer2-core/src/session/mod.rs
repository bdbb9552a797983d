//! Persistent shell session engine
//!
//! - `stream`: PTY reader thread and expect-style buffer
//! - `shell`: spawn, lifecycle and close of one shell on a PTY
//! - `prompt`: installs the unique prompt token after spawn
//! - `executor`: one command in, captured output out
//! - `supervisor`: the single execution slot; lazy open and recreation

mod error;
mod executor;
mod prompt;
mod shell;
mod stream;
mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SessionError};
pub use executor::{ECHO_WAIT, INTERRUPTED_NOTICE, INTERRUPT_WAIT, STILL_BUSY_NOTICE};
pub use prompt::PROMPT_QUIET_WINDOW;
pub use shell::{SessionOptions, SessionState, ShellProcess, ShellSession};
pub use stream::{Expect, Pattern, PtyStream};
pub use supervisor::{
    PtyLauncher, SessionLauncher, SessionSupervisor, SESSION_RESET_NOTICE, WORKING_DIR_QUERY_TIMEOUT,
};
