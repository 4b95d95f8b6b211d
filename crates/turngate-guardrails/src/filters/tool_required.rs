use turngate_core::GuardrailVerdict;

use crate::catalog;
use crate::context::GuardrailContext;

const NAME: &str = "tool_required_enforcement";

/// Filter 5 (§4.11): an intent in the business's tool-required set (e.g.
/// `product_spec`, `stock_check`) must never be answered from the LLM's own
/// knowledge — if no tool ran successfully this turn, replace with a
/// deterministic clarification.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    let Some(intent) = ctx.intent else {
        return GuardrailVerdict::pass(NAME);
    };
    if !ctx.tool_required_intents.iter().any(|i| i == intent) {
        return GuardrailVerdict::pass(NAME);
    }
    if ctx.had_tool_success {
        return GuardrailVerdict::pass(NAME);
    }
    GuardrailVerdict::sanitize(NAME, catalog::missing_identifier(ctx.language, intent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::TurnState;

    fn ctx<'a>(
        intent: Option<&'a str>,
        required: &'a [String],
        had_tool_success: bool,
        state: &'a TurnState,
    ) -> GuardrailContext<'a> {
        GuardrailContext {
            response: "Our standard stock levels are usually high.",
            language: "en",
            state,
            tool_results: &[],
            intent,
            tool_required_intents: required,
            had_tool_success,
        }
    }

    #[test]
    fn passes_when_intent_not_tool_required() {
        let state = TurnState::default();
        let required = vec!["product_spec".to_string()];
        assert!(check(&ctx(Some("chitchat"), &required, false, &state)).is_pass());
    }

    #[test]
    fn blocks_tool_required_intent_without_a_tool_call() {
        let state = TurnState::default();
        let required = vec!["stock_check".to_string()];
        let v = check(&ctx(Some("stock_check"), &required, false, &state));
        assert!(!v.is_pass());
    }

    #[test]
    fn passes_when_tool_required_intent_had_a_successful_call() {
        let state = TurnState::default();
        let required = vec!["stock_check".to_string()];
        assert!(check(&ctx(Some("stock_check"), &required, true, &state)).is_pass());
    }
}
