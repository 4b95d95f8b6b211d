use turngate_core::{CorrectionType, GuardrailVerdict};

use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "internal_protocol_guard";

/// Filter 8 (§4.11): self-description leaks ("as an AI", "I don't have
/// access", "system policy forbids") request a correction; if the
/// correction also fails, the orchestrator falls back to a deterministic
/// safe message (the fallback itself lives in `chain::run`'s caller, not
/// here — this filter only ever asks for a correction, never blocks
/// directly, since the LLM itself can usually rephrase).
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if !patterns::has_self_description(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }
    GuardrailVerdict::need_correction(
        NAME,
        CorrectionType::InternalProtocolLeak,
        "Never describe yourself as an AI, a language model, or reference internal system policy. Answer as the business's assistant.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::TurnState;

    fn ctx<'a>(response: &'a str, state: &'a TurnState) -> GuardrailContext<'a> {
        GuardrailContext {
            response,
            language: "en",
            state,
            tool_results: &[],
            intent: None,
            tool_required_intents: &[],
            had_tool_success: false,
        }
    }

    #[test]
    fn flags_ai_self_description() {
        let state = TurnState::default();
        let v = check(&ctx("As an AI, I don't have access to that system.", &state));
        assert!(!v.is_pass());
    }

    #[test]
    fn passes_normal_response() {
        let state = TurnState::default();
        assert!(check(&ctx("Let me check that order for you.", &state)).is_pass());
    }
}
