use turngate_core::GuardrailVerdict;

use crate::catalog;
use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "response_firewall";

/// Filter 1 (§4.11): internal-technical vocabulary, tool names, raw
/// JSON/HTML, system-prompt disclosure → soft refusal.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if patterns::has_internal_vocab(ctx.response) {
        return GuardrailVerdict::sanitize(NAME, catalog::firewall_soft_refusal(ctx.language));
    }
    GuardrailVerdict::pass(NAME)
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
    fn passes_plain_text() {
        let state = TurnState::default();
        assert!(check(&ctx("Your order ships tomorrow.", &state)).is_pass());
    }

    #[test]
    fn sanitizes_json_dump() {
        let state = TurnState::default();
        let v = check(&ctx(r#"{"tool": "order_status"}"#, &state));
        assert!(!v.is_pass());
    }
}
