//! # asms-agent
//!
//! Conversation-driven, tool-calling chat loop over the Gateway-as-
//! tool-surface.

pub mod agent;
pub mod prompt;
pub mod skill;
pub mod units;

pub use agent::Agent;
pub use skill::{InMemorySkillStore, Skill, SkillStore};
