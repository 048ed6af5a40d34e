//! Wraps the Agent and the Skill collaborator as `agent.*` Command/Query
//! units, for the second phase of startup: these get registered into a
//! Registry that already has a Gateway backing the Adapter the Agent
//! itself was built from.

use crate::agent::Agent;
use crate::skill::{Skill, SkillStore};
use asms_core::{CommandUnit, QueryUnit, SchemaNode, UnitContext, UnitError, UnitMeta};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct AgentChatCommand {
    meta: UnitMeta,
    agent: Arc<Agent>,
    enabled: bool,
}

impl AgentChatCommand {
    pub fn new(agent: Arc<Agent>, enabled: bool) -> Self {
        let meta = UnitMeta::new("agent.chat", "agent", "Send a message to the agent and receive its reply")
            .with_input_schema(
                SchemaNode::object()
                    .with_property("message", SchemaNode::string())
                    .with_property("conv_id", SchemaNode::string())
                    .required(["message"]),
            )
            .with_output_schema(
                SchemaNode::object()
                    .with_property("content", SchemaNode::string())
                    .with_property("conv_id", SchemaNode::string())
                    .required(["content", "conv_id"]),
            );
        Self { meta, agent, enabled }
    }
}

#[async_trait]
impl CommandUnit for AgentChatCommand {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    async fn execute(&self, ctx: UnitContext, input: Value) -> Result<Value, UnitError> {
        if !self.enabled {
            return Err(UnitError::agent_not_enabled());
        }
        let message = input
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| UnitError::invalid_input(vec!["message".to_string()]))?
            .to_string();
        let conv_id = input.get("conv_id").and_then(Value::as_str).map(str::to_string);

        let reply = self.agent.chat(ctx.child_token(), conv_id, message).await?;
        Ok(json!({"content": reply.content, "conv_id": reply.conv_id}))
    }
}

pub struct AgentSkillListQuery {
    meta: UnitMeta,
    skills: Arc<dyn SkillStore>,
}

impl AgentSkillListQuery {
    pub fn new(skills: Arc<dyn SkillStore>) -> Self {
        let meta = UnitMeta::new("agent.skill_list", "agent", "List every registered skill")
            .with_output_schema(SchemaNode::object());
        Self { meta, skills }
    }
}

#[async_trait]
impl QueryUnit for AgentSkillListQuery {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    async fn execute(&self, _ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
        let skills: Vec<Value> = self.skills.list().into_iter().map(skill_to_json).collect();
        Ok(json!({"skills": skills}))
    }
}

pub struct AgentSkillUpsertCommand {
    meta: UnitMeta,
    skills: Arc<dyn SkillStore>,
}

impl AgentSkillUpsertCommand {
    pub fn new(skills: Arc<dyn SkillStore>) -> Self {
        let meta = UnitMeta::new("agent.skill_upsert", "agent", "Create or replace a non-builtin skill")
            .with_input_schema(
                SchemaNode::object()
                    .with_property("id", SchemaNode::string())
                    .with_property("body", SchemaNode::string())
                    .with_property("always_on", SchemaNode::boolean())
                    .with_property("keywords", SchemaNode::array(SchemaNode::string()))
                    .required(["id", "body"]),
            );
        Self { meta, skills }
    }
}

#[async_trait]
impl CommandUnit for AgentSkillUpsertCommand {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    async fn execute(&self, _ctx: UnitContext, input: Value) -> Result<Value, UnitError> {
        let mut missing = Vec::new();
        let id = input.get("id").and_then(Value::as_str);
        let body = input.get("body").and_then(Value::as_str);
        if id.is_none() {
            missing.push("id".to_string());
        }
        if body.is_none() {
            missing.push("body".to_string());
        }
        if !missing.is_empty() {
            return Err(UnitError::invalid_input(missing));
        }

        let always_on = input.get("always_on").and_then(Value::as_bool).unwrap_or(false);
        let keywords = input
            .get("keywords")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        self.skills.upsert(Skill {
            id: id.unwrap().to_string(),
            body: body.unwrap().to_string(),
            always_on,
            keywords,
            builtin: false,
        })?;
        Ok(json!({"ok": true}))
    }
}

pub struct AgentSkillRemoveCommand {
    meta: UnitMeta,
    skills: Arc<dyn SkillStore>,
}

impl AgentSkillRemoveCommand {
    pub fn new(skills: Arc<dyn SkillStore>) -> Self {
        let meta = UnitMeta::new("agent.skill_remove", "agent", "Delete a non-builtin skill")
            .with_input_schema(SchemaNode::object().with_property("id", SchemaNode::string()).required(["id"]));
        Self { meta, skills }
    }
}

#[async_trait]
impl CommandUnit for AgentSkillRemoveCommand {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    async fn execute(&self, _ctx: UnitContext, input: Value) -> Result<Value, UnitError> {
        let id = input
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| UnitError::invalid_input(vec!["id".to_string()]))?;
        self.skills.remove(id)?;
        Ok(json!({"ok": true}))
    }
}

fn skill_to_json(skill: Skill) -> Value {
    json!({
        "id": skill.id,
        "body": skill.body,
        "always_on": skill.always_on,
        "keywords": skill.keywords,
        "builtin": skill.builtin,
    })
}
