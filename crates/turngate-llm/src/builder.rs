use turngate_core::TurnState;
use turngate_tools::ToolRegistry;

use crate::provider::{ChatRequest, Message, Role, ToolDefinition};

/// Composes `systemPrompt ⊕ injectionContext? ⊕ history ⊕ userMessage ⊕
/// toolSchemas(gated)` (§4.10).
pub struct RequestBuilder<'a> {
    pub model: String,
    pub max_tokens: u32,
    pub registry: &'a ToolRegistry,
}

impl<'a> RequestBuilder<'a> {
    pub fn build(
        &self,
        system_prompt: &str,
        injection_context: Option<&str>,
        history: &[Message],
        user_message: &str,
        state: &TurnState,
    ) -> ChatRequest {
        let system = match injection_context {
            Some(ctx) => format!("{system_prompt}\n\n{ctx}"),
            None => system_prompt.to_string(),
        };

        let mut messages: Vec<Message> = history.to_vec();
        messages.push(Message { role: Role::User, content: user_message.to_string() });

        let tools: Vec<ToolDefinition> = self
            .registry
            .gated_for(state)
            .into_iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: format!("{} tool", t.name()),
                input_schema: t.input_schema(),
            })
            .collect();

        ChatRequest {
            model: self.model.clone(),
            system,
            messages,
            max_tokens: self.max_tokens,
            tools,
            raw_messages: None,
        }
    }
}
