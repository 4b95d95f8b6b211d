//! Bounded LLM <-> tool exchange (§4.10): ask the LLM, execute any function
//! calls it returns, append the `{name, args, result}` triple to history, and
//! repeat until the reply is text-only or the iteration bound is hit.

use tracing::{info, instrument};
use turngate_core::{Outcome, SessionId, ToolResult, TurnId};
use turngate_tools::{ToolContext, ToolExecutor};

use crate::error::LlmError;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider};

#[derive(Debug, Clone)]
pub struct LoopResult {
    pub reply: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub tools_called: Vec<String>,
    pub tool_results: Vec<ToolResult>,
    pub had_tool_success: bool,
    pub had_tool_failure: bool,
    /// Set when a tool result's outcome should short-circuit the remaining
    /// guardrail/grounding pipeline straight to a deterministic reply — e.g.
    /// `VERIFICATION_REQUIRED` (§4.6) or `INFRA_ERROR` (§4.8).
    pub terminal_outcome: Option<Outcome>,
}

/// Runs the tool loop to completion, up to `max_iterations` LLM calls.
/// Reaching the bound with function calls still pending ends the turn on the
/// last reply received, tagged `IterationBoundExceeded` in the trace rather
/// than surfaced to the caller as an error — a bounded loop never fails open.
#[instrument(skip(provider, executor, request), fields(session_id = %session_id, max_iterations))]
pub async fn run_tool_loop(
    provider: &dyn LlmProvider,
    executor: &ToolExecutor<'_>,
    mut request: ChatRequest,
    max_iterations: u32,
    ctx: &ToolContext<'_>,
    session_id: &SessionId,
    turn_id: &TurnId,
    language: &str,
) -> Result<LoopResult, LlmError> {
    let mut input_tokens = 0u32;
    let mut output_tokens = 0u32;
    let mut tools_called = Vec::new();
    let mut tool_results = Vec::new();
    let mut had_tool_success = false;
    let mut had_tool_failure = false;
    let mut raw_history: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                crate::provider::Role::Assistant => "assistant",
                _ => "user",
            };
            serde_json::json!({"role": role, "content": m.content})
        })
        .collect();

    for iteration in 0..max_iterations {
        let response: ChatResponse = provider.send(&request).await?;
        input_tokens += response.tokens_in;
        output_tokens += response.tokens_out;

        if response.is_text_only() {
            return Ok(LoopResult {
                reply: response.content,
                input_tokens,
                output_tokens,
                tools_called,
                tool_results,
                had_tool_success,
                had_tool_failure,
                terminal_outcome: None,
            });
        }

        let mut assistant_content = Vec::new();
        if !response.content.is_empty() {
            assistant_content.push(serde_json::json!({"type": "text", "text": response.content}));
        }
        for call in &response.tool_calls {
            assistant_content.push(serde_json::json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.input,
            }));
        }
        raw_history.push(serde_json::json!({"role": "assistant", "content": assistant_content}));

        let mut tool_result_blocks = Vec::new();
        for call in &response.tool_calls {
            tools_called.push(call.name.clone());
            let result = executor
                .run(&call.name, call.input.clone(), ctx, session_id, turn_id, language)
                .await;

            info!(
                tool = %call.name,
                outcome = %result.outcome,
                iteration,
                "tool call executed"
            );

            match result.outcome {
                Outcome::Ok => had_tool_success = true,
                Outcome::InfraError | Outcome::ValidationError => had_tool_failure = true,
                _ => {}
            }

            let terminal = matches!(
                result.outcome,
                Outcome::VerificationRequired | Outcome::Denied | Outcome::InfraError
            );

            tool_result_blocks.push(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": call.id,
                "content": result.message,
            }));
            let outcome = result.outcome;
            tool_results.push(result);

            if terminal {
                return Ok(LoopResult {
                    reply: String::new(),
                    input_tokens,
                    output_tokens,
                    tools_called,
                    tool_results,
                    had_tool_success,
                    had_tool_failure,
                    terminal_outcome: Some(outcome),
                });
            }
        }
        raw_history.push(serde_json::json!({"role": "user", "content": tool_result_blocks}));

        request.raw_messages = Some(raw_history.clone());
    }

    Ok(LoopResult {
        reply: String::new(),
        input_tokens,
        output_tokens,
        tools_called,
        tool_results,
        had_tool_success,
        had_tool_failure,
        terminal_outcome: Some(Outcome::InfraError),
    })
}
