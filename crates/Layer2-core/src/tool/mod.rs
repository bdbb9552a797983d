//! Tool System
//!
//! 고정된 도구 목록에 대해 Layer1 `Tool` trait를 구현하고
//! `ToolDispatcher`를 통해 호출을 라우팅합니다.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolDispatcher                                             │
//! │  ├── list() - descriptors in catalogue order                │
//! │  └── invoke(name, args) - always a ToolResult               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RuntimeContext (ToolContext implementation)                │
//! │  ├── check_command() - safety filter                        │
//! │  ├── run_command() - session supervisor                     │
//! │  └── working_dir() - `pwd` in the session, with fallback    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools                                              │
//! │  ├── RunCommandTool                                         │
//! │  ├── ReadFileTool                                           │
//! │  ├── WriteFileTool                                          │
//! │  └── ListDirectoryTool                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```ignore
//! let ctx = Arc::new(RuntimeContext::new(supervisor, filter, config.timeouts));
//! let dispatcher = ToolDispatcher::new(all_tools(), ctx)?;
//! let result = dispatcher.invoke("run-command", json!({"command": "ls"})).await;
//! ```

pub mod builtin;
mod context;
mod dispatcher;

pub use dock_foundation::{Tool, ToolContext};

pub use builtin::{
    all_tools, ListDirectoryTool, ReadFileTool, RunCommandTool, WriteFileTool,
};
pub use context::RuntimeContext;
pub use dispatcher::{ToolDescriptor, ToolDispatcher};
