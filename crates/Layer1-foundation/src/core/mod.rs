//! Core Module - shared interfaces and types
//!
//! - `types.rs`: command request/result values and the timeout policy
//! - `traits.rs`: `Tool` and `ToolContext`

pub mod traits;
pub mod types;

// ============================================================================
// Types (types.rs)
// ============================================================================
pub use types::{CommandOutcome, CommandRequest, CommandResult, TimeoutBounds};

// ============================================================================
// Traits (traits.rs)
// ============================================================================
pub use traits::{Tool, ToolContext, ToolExecutionResult, ToolMeta, ToolResult};
