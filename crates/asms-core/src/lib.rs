//! # asms-core
//!
//! Shared data model for the control plane: the typed operation contract
//! (`Unit`), the wire shapes every front-end speaks (`Request`/`Response`),
//! the one error envelope every outcome is expressed in (`UnitError`),
//! resources, events, conversation/message types, and configuration.
//!
//! Nothing in this crate knows about Docker, HuggingFace, an LLM
//! provider's wire format, or a transport. Those are the job of the
//! crates layered on top (`asms-registry`, `asms-gateway`, `asms-mcp`,
//! `asms-llm`, `asms-agent`).

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod resource;
pub mod schema;
pub mod unit;
pub mod wire;

pub use config::{AgentConfig, AsmsConfig, ConversationConfig, GatewayConfig, HttpConfig, McpConfig};
pub use conversation::{Conversation, Message, Role, ToolCall, ToolDef};
pub use error::{Error, Result, UnitError};
pub use event::Event;
pub use resource::{Resource, ResourceFactory, ResourceOperation, ResourceUpdate};
pub use schema::{validate_or_error, SchemaNode, SchemaType};
pub use unit::{ArcCommand, ArcQuery, CommandUnit, QueryUnit, UnitContext, UnitKind, UnitMeta};
pub use wire::{Request, RequestOptions, RequestType, Response};
