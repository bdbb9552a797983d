//! Registry
//!
//! - `shell/` - supported shells (bash, zsh, sh, xonsh)

pub mod shell;

// Shell
pub use shell::ShellType;
