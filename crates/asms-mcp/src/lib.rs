//! # asms-mcp
//!
//! Translates the unit/resource model into the Model Context Protocol
//! and serves it over stdio and SSE.

pub mod adapter;
pub mod jsonrpc;
pub mod sse;
pub mod stdio;
pub mod types;

pub use adapter::{mcp_tool_name, unit_name_from_tool, Adapter, Notifier};
pub use jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
pub use stdio::run_stdio_server;
pub use types::{ContentBlock, ResourceDescriptor, ToolDefinition, ToolResult};
