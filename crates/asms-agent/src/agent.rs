//! The agent loop itself.

use crate::prompt::build_system_prompt;
use crate::skill::SkillStore;
use asms_conversation::ConversationStore;
use asms_core::conversation::{Message, ToolDef};
use asms_core::UnitError;
use asms_llm::{ChatOptions, LlmClient};
use asms_mcp::adapter::Adapter;
use asms_mcp::types::ContentBlock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AgentReply {
    pub content: String,
    pub conv_id: String,
}

pub struct Agent {
    adapter: Arc<Adapter>,
    llm: Arc<dyn LlmClient>,
    conversations: Arc<ConversationStore>,
    skills: Arc<dyn SkillStore>,
    max_tool_call_rounds: u32,
}

impl Agent {
    pub fn new(
        adapter: Arc<Adapter>,
        llm: Arc<dyn LlmClient>,
        conversations: Arc<ConversationStore>,
        skills: Arc<dyn SkillStore>,
        max_tool_call_rounds: u32,
    ) -> Self {
        Self {
            adapter,
            llm,
            conversations,
            skills,
            max_tool_call_rounds,
        }
    }

    pub async fn chat(
        &self,
        scope: CancellationToken,
        conv_id: Option<String>,
        user_message: String,
    ) -> Result<AgentReply, UnitError> {
        let conversation = self.conversations.get_or_create(conv_id.as_deref().unwrap_or("")).await;
        let id = conversation.id.clone();
        self.conversations.add_message(&id, Message::user(user_message.clone())).await;

        let tools: Vec<ToolDef> = self
            .adapter
            .list_tools()
            .into_iter()
            .map(|t| ToolDef {
                name: t.name,
                description: t.description,
                input_schema: t.input_schema,
            })
            .collect();

        let system_prompt = build_system_prompt(self.skills.as_ref(), &user_message);
        let opts = ChatOptions::default();

        for _round in 0..self.max_tool_call_rounds {
            let conversation = self
                .conversations
                .get(&id)
                .await
                .ok_or_else(|| UnitError::conversation_not_found(&id))?;

            let mut messages = vec![Message::system(system_prompt.clone())];
            messages.extend(conversation.messages.iter().cloned());

            let outcome = self
                .llm
                .chat(&messages, &tools, &opts)
                .await
                .map_err(UnitError::from)?;

            self.conversations.add_message(&id, outcome.message.clone()).await;

            if outcome.tool_calls.is_empty() {
                return Ok(AgentReply {
                    content: outcome.message.content,
                    conv_id: id,
                });
            }

            for call in &outcome.tool_calls {
                let args_json = serde_json::to_string(&call.arguments).unwrap_or_else(|_| "{}".to_string());
                let result = self.adapter.execute_tool(scope.child_token(), &call.name, &args_json).await;
                let content = join_content(&result.content);
                self.conversations
                    .add_message(&id, Message::tool_result(call.id.clone(), content))
                    .await;
            }
        }

        Err(UnitError::agent_tool_loop_exceeded(self.max_tool_call_rounds))
    }
}

fn join_content(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|b| match b {
            ContentBlock::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::InMemorySkillStore;
    use asms_llm::{ChatOutcome, Usage};
    use asms_registry::RegistryBuilder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubLlm {
        calls: AtomicUsize,
        responses: Vec<ChatOutcome>,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        fn name(&self) -> &str {
            "stub"
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolDef],
            _opts: &ChatOptions,
        ) -> Result<ChatOutcome, asms_llm::LlmError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses[i.min(self.responses.len() - 1)].clone())
        }
    }

    fn text_outcome(text: &str) -> ChatOutcome {
        ChatOutcome {
            message: Message::assistant(text),
            tool_calls: Vec::new(),
            usage: Usage::default(),
        }
    }

    fn agent_with(llm: StubLlm) -> Agent {
        let registry = Arc::new(RegistryBuilder::new().build());
        let resources = Arc::new(asms_registry::ResourceRegistry::new());
        let config = asms_core::GatewayConfig::default();
        let gateway = Arc::new(asms_gateway::Gateway::new(registry, resources, config));
        let adapter = Arc::new(Adapter::new(gateway));
        Agent::new(
            adapter,
            Arc::new(llm),
            Arc::new(ConversationStore::new(100)),
            Arc::new(InMemorySkillStore::new()),
            10,
        )
    }

    #[tokio::test]
    async fn no_tool_calls_returns_assistant_content_directly() {
        let agent = agent_with(StubLlm {
            calls: AtomicUsize::new(0),
            responses: vec![text_outcome("hello there")],
        });

        let reply = agent.chat(CancellationToken::new(), None, "hi".to_string()).await.unwrap();
        assert_eq!(reply.content, "hello there");
        assert!(!reply.conv_id.is_empty());
    }

    #[tokio::test]
    async fn exhausting_rounds_without_final_text_is_agent_tool_loop_exceeded() {
        let call = asms_core::conversation::ToolCall {
            id: "call_1".to_string(),
            name: "model_list".to_string(),
            arguments: Default::default(),
        };
        let looping_call = ChatOutcome {
            message: Message::assistant_with_tool_calls("", vec![call.clone()]),
            tool_calls: vec![call],
            usage: Usage::default(),
        };
        let agent = agent_with(StubLlm {
            calls: AtomicUsize::new(0),
            responses: vec![looping_call],
        });

        let err = agent
            .chat(CancellationToken::new(), None, "list models forever".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code, "agent_tool_loop_exceeded");
    }

    #[tokio::test]
    async fn same_conversation_is_reused_across_turns() {
        let agent = agent_with(StubLlm {
            calls: AtomicUsize::new(0),
            responses: vec![text_outcome("first"), text_outcome("second")],
        });

        let first = agent.chat(CancellationToken::new(), None, "one".to_string()).await.unwrap();
        let second = agent
            .chat(CancellationToken::new(), Some(first.conv_id.clone()), "two".to_string())
            .await
            .unwrap();

        assert_eq!(first.conv_id, second.conv_id);
        assert_eq!(second.content, "second");
    }
}
