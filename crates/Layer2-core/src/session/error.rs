//! Error types for the session engine
//!
//! SessionError covers PTY/shell lifecycle failures. Command-level
//! conditions (timeout, end-of-stream mid-command) are outcomes on
//! `CommandResult`, not errors.

use dock_foundation::Error as FoundationError;
use std::io;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while opening or driving a shell session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Shell binary missing or PTY allocation failed
    #[error("Failed to spawn shell: {0}")]
    SpawnError(String),

    /// Prompt token never appeared after start
    #[error("Shell did not present the prompt within {0} seconds")]
    StartupTimeout(u64),

    /// A previous request never finished (its caller went away mid-command)
    #[error("Shell session is busy with another command")]
    SessionBusy,

    /// The shell process has exited
    #[error("Shell session is closed")]
    SessionClosed,

    /// A stuck command ignored the interrupt; the session was abandoned
    #[error("Shell session stopped responding")]
    Unresponsive,

    /// The command cannot be framed (for example it spans several lines)
    #[error("Command cannot be sent: {0}")]
    InvalidCommand(String),

    /// IO error on the PTY
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Whether a fresh `open()` may fix this
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StartupTimeout(_)
                | Self::SessionBusy
                | Self::SessionClosed
                | Self::Unresponsive
                | Self::Io(_)
        )
    }
}

// ============================================================================
// dock_foundation::Error conversion
// ============================================================================

impl From<SessionError> for FoundationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::StartupTimeout(secs) => {
                FoundationError::Timeout(format!("shell startup after {secs}s"))
            }
            SessionError::Io(e) => FoundationError::Io(e),
            SessionError::InvalidCommand(msg) => FoundationError::InvalidInput(msg),
            other => FoundationError::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_foundation() {
        let err: FoundationError = SessionError::SpawnError("no bash".into()).into();
        assert!(matches!(err, FoundationError::Session(_)));
        assert_eq!(err.to_string(), "Session error: Failed to spawn shell: no bash");

        let err: FoundationError = SessionError::StartupTimeout(10).into();
        assert!(matches!(err, FoundationError::Timeout(_)));
    }

    #[test]
    fn test_recoverable() {
        assert!(SessionError::SessionClosed.is_recoverable());
        assert!(SessionError::Unresponsive.is_recoverable());
        assert!(!SessionError::SpawnError("x".into()).is_recoverable());
        assert!(!SessionError::InvalidCommand("x".into()).is_recoverable());
    }
}
