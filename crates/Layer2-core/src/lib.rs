//! dock-core: Core Runtime for ShellDock
//!
//! Layer2 - the persistent shell engine and the tools built on it
//!
//! # Modules
//!
//! - `session`: PTY shell session, prompt synchronization, command executor, supervisor
//! - `filter`: deny-list safety filter applied before a command is sent
//! - `tool`: tool dispatcher, runtime context and the builtin tools
//! - `mcp`: MCP stdio server exposing the tools to an agent host
//!
//! # Example
//!
//! ```ignore
//! use dock_core::{all_tools, McpServer, RuntimeContext, SafetyFilter};
//! use dock_core::{SessionOptions, SessionSupervisor, ToolDispatcher};
//!
//! let supervisor = Arc::new(SessionSupervisor::with_options(SessionOptions::from(&config)));
//! let ctx = Arc::new(RuntimeContext::new(supervisor.clone(), SafetyFilter::builtin()?, config.timeouts));
//! let dispatcher = Arc::new(ToolDispatcher::new(all_tools(), ctx)?);
//!
//! let result = dispatcher.invoke("run-command", json!({"command": "cd src && ls"})).await;
//!
//! McpServer::new(dispatcher).serve(stdin, stdout).await?;
//! supervisor.shutdown().await;
//! ```

pub mod filter;
pub mod mcp;
pub mod session;
pub mod tool;

// Re-exports: Session
pub use session::{
    SessionError, SessionLauncher, SessionOptions, SessionState, SessionSupervisor,
    ShellSession, PtyLauncher,
};

// Re-exports: Filter
pub use filter::{normalize_command, SafetyFilter};

// Re-exports: Tool
pub use tool::{
    // Functions
    all_tools,
    // Tools
    ListDirectoryTool,
    ReadFileTool,
    RunCommandTool,
    WriteFileTool,
    // Context
    RuntimeContext,
    // Tool trait
    Tool,
    ToolContext,
    // Dispatcher
    ToolDescriptor,
    ToolDispatcher,
};

// Re-exports: MCP
pub use mcp::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, McpToolResult};
