//! # dock-foundation
//!
//! Foundation layer for ShellDock:
//! - Core: `Tool` / `ToolContext` traits and command request/result types
//! - Permission: the immutable deny pattern set
//! - Registry: supported shells and how to drive them
//! - Config: layered `settings.json` loading
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Tool Dispatcher (run-command, read-file, ...)          │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          Safety Filter (deny patterns)                  │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          Command Executor ── Session Supervisor         │
//! │                                     │                   │
//! │                                     ▼                   │
//! │                           PTY + interactive shell       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod permission;
pub mod registry;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (traits and types)
// ============================================================================
pub use core::{
    CommandOutcome, CommandRequest, CommandResult, TimeoutBounds, Tool, ToolContext,
    ToolExecutionResult, ToolMeta, ToolResult,
};

// ============================================================================
// Permission
// ============================================================================
pub use permission::{builtin_deny_patterns, DenyCategory, DenyPattern, DenyPatternSet, Verdict};

// ============================================================================
// Registry
// ============================================================================
pub use registry::ShellType;

// ============================================================================
// Config
// ============================================================================
pub use config::{ConfigLoader, DockConfig, DockSettings, PtySizeConfig};
