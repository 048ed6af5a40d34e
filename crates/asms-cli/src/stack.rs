//! Builds the full runtime stack from an [`AsmsConfig`], following a
//! two-phase startup ordering: Registry + Gateway first with no domain
//! units, an Adapter and Agent built against that Gateway, then a
//! second Registry/Gateway that also carries the `agent.*` units
//! wrapping the already-constructed Agent.

use anyhow::{anyhow, Context, Result};
use asms_agent::units::{AgentChatCommand, AgentSkillListQuery, AgentSkillRemoveCommand, AgentSkillUpsertCommand};
use asms_agent::{Agent, InMemorySkillStore, SkillStore};
use asms_conversation::ConversationStore;
use asms_core::AsmsConfig;
use asms_gateway::Gateway;
use asms_llm::{AnthropicClient, LlmClient, LocalOpenAiClient, OpenAiCompatibleClient};
use asms_mcp::Adapter;
use asms_registry::{RegistryBuilder, ResourceRegistry};
use std::sync::Arc;

/// Everything a transport needs to serve requests: the final Gateway
/// (with `agent.*` units registered) and the conversation store's
/// reaper depends on, kept alive for the process lifetime.
pub struct Stack {
    pub gateway: Arc<Gateway>,
    pub conversations: Arc<ConversationStore>,
}

pub fn build_stack(config: &AsmsConfig) -> Result<Stack> {
    // Phase one: a Registry/Gateway with no domain units at all, just to
    // back the Adapter the Agent uses as its tool executor. Domain unit
    // implementations are left to deployments that embed this stack; the
    // binary itself only registers the `agent.*` units below.
    let inner_registry = Arc::new(RegistryBuilder::new().build());
    let inner_resources = Arc::new(ResourceRegistry::new());
    let inner_gateway = Arc::new(Gateway::new(inner_registry, inner_resources, config.gateway.clone()));
    let adapter = Arc::new(Adapter::new(inner_gateway));

    let llm = build_llm_client(config)?;
    let conversations = Arc::new(ConversationStore::new(config.conversation.max_messages));
    let skills: Arc<dyn SkillStore> = Arc::new(InMemorySkillStore::new());
    let agent = Arc::new(Agent::new(
        adapter,
        llm,
        conversations.clone(),
        skills.clone(),
        config.agent.max_tool_call_rounds,
    ));

    // Phase two: the registry callers actually talk to, carrying the
    // `agent.*` units on top of the Agent built in phase one.
    let mut builder = RegistryBuilder::new();
    builder.register_command(Arc::new(AgentChatCommand::new(agent.clone(), config.agent.enabled)))?;
    builder.register_query(Arc::new(AgentSkillListQuery::new(skills.clone())))?;
    builder.register_command(Arc::new(AgentSkillUpsertCommand::new(skills.clone())))?;
    builder.register_command(Arc::new(AgentSkillRemoveCommand::new(skills)))?;
    let registry = Arc::new(builder.build());
    let resources = Arc::new(ResourceRegistry::new());
    let gateway = Arc::new(Gateway::new(registry, resources, config.gateway.clone()));

    Ok(Stack { gateway, conversations })
}

/// Picks the `LlmClient` named by `config.agent.provider`, reading its
/// API key from the provider's usual environment variable.
fn build_llm_client(config: &AsmsConfig) -> Result<Arc<dyn LlmClient>> {
    let model = config.agent.model.clone();
    let client: Arc<dyn LlmClient> = match config.agent.provider.as_str() {
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
            Arc::new(OpenAiCompatibleClient::new(api_key, model))
        }
        "anthropic" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY is not set")?;
            Arc::new(AnthropicClient::new(api_key, model))
        }
        "local" => {
            let base_url =
                std::env::var("ASMS_LOCAL_LLM_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080/v1".to_string());
            let client = LocalOpenAiClient::new(base_url, model);
            let client = match std::env::var("ASMS_LOCAL_LLM_API_KEY") {
                Ok(key) => client.with_api_key(key),
                Err(_) => client,
            };
            Arc::new(client)
        }
        other => return Err(anyhow!("unknown agent.provider '{other}' (expected openai, anthropic, or local)")),
    };
    Ok(client)
}
