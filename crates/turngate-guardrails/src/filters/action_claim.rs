use turngate_core::GuardrailVerdict;

use crate::catalog;
use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "action_claim_policy";

/// Filter 10 (§4.11), soft: if the response claims an action was completed
/// (e.g. "I processed your callback") but no tool succeeded this turn,
/// rewrite the claim into an offer rather than blocking the turn outright.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    let Some(claim) = patterns::find_action_claim(ctx.response) else {
        return GuardrailVerdict::pass(NAME);
    };
    if ctx.had_tool_success {
        return GuardrailVerdict::pass(NAME);
    }
    let topic = claim.trim();
    GuardrailVerdict::sanitize(NAME, catalog::action_offer_rewrite(ctx.language, topic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::TurnState;

    fn ctx<'a>(response: &'a str, had_tool_success: bool, state: &'a TurnState) -> GuardrailContext<'a> {
        GuardrailContext {
            response,
            language: "en",
            state,
            tool_results: &[],
            intent: None,
            tool_required_intents: &[],
            had_tool_success,
        }
    }

    #[test]
    fn rewrites_unbacked_action_claim() {
        let state = TurnState::default();
        let v = check(&ctx("I've processed your callback request.", false, &state));
        assert!(!v.is_pass());
    }

    #[test]
    fn passes_when_tool_actually_succeeded() {
        let state = TurnState::default();
        assert!(check(&ctx("I've processed your callback request.", true, &state)).is_pass());
    }

    #[test]
    fn passes_plain_response() {
        let state = TurnState::default();
        assert!(check(&ctx("Let me know if you need anything else.", false, &state)).is_pass());
    }
}
