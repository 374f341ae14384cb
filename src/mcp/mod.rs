//! MCP server implementation.
//!
//! Provides the Model Context Protocol surface for the sequential thinking
//! tool.
//!
//! ## Features
//!
//! - **Tools**: `sequentialthinking`
//! - **Transports**: stdio (default), HTTP (`http` cargo feature)
//!
//! ## Usage
//!
//! ### Stdio Transport (Claude Desktop)
//!
//! ```bash
//! seqthink serve
//! ```
//!
//! ### Claude Desktop Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "seqthink": {
//!       "command": "seqthink",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

mod dispatch;
mod server;
mod tools;

pub use server::{McpServer, RateLimitConfig, Transport};
pub use tools::{TOOL_NAME, ToolContent, ToolDefinition, ToolRegistry, ToolResult};
