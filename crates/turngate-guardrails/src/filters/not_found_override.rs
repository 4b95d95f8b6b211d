use turngate_core::{GuardrailVerdict, Outcome};

use crate::catalog;
use crate::context::GuardrailContext;

const NAME: &str = "not_found_early_override";

/// Filter 3 (§4.11): if any tool outcome this turn is `NOT_FOUND` and the
/// draft response doesn't acknowledge it (or worse, fabricates order
/// fields), replace it with the deterministic not-found message. When this
/// fires, the Leak Filter is skipped for the rest of the chain — there is
/// no sensitive record left to protect once the canned message is in place
/// (enforced by `chain::run` stopping at the first terminal verdict).
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    let any_not_found = ctx.tool_results.iter().any(|r| r.outcome == Outcome::NotFound);
    if !any_not_found {
        return GuardrailVerdict::pass(NAME);
    }

    if acknowledges_not_found(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }

    GuardrailVerdict::sanitize(NAME, catalog::not_found_override(ctx.language))
}

fn acknowledges_not_found(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("not found")
        || lower.contains("no record")
        || lower.contains("couldn't find")
        || lower.contains("could not find")
        || lower.contains("bulunamadı")
        || lower.contains("bulunamadi")
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::{ToolResult, TurnState};

    fn ctx<'a>(response: &'a str, results: &'a [ToolResult], state: &'a TurnState) -> GuardrailContext<'a> {
        GuardrailContext {
            response,
            language: "en",
            state,
            tool_results: results,
            intent: None,
            tool_required_intents: &[],
            had_tool_success: false,
        }
    }

    #[test]
    fn passes_when_no_not_found_outcome() {
        let state = TurnState::default();
        assert!(check(&ctx("All good.", &[], &state)).is_pass());
    }

    #[test]
    fn overrides_fabricated_response_on_not_found() {
        let state = TurnState::default();
        let results = vec![ToolResult::new("order_status", Outcome::NotFound, "no row")];
        let v = check(&ctx("Your order shipped yesterday and will arrive Monday.", &results, &state));
        assert!(!v.is_pass());
    }

    #[test]
    fn passes_when_response_already_acknowledges_absence() {
        let state = TurnState::default();
        let results = vec![ToolResult::new("order_status", Outcome::NotFound, "no row")];
        let v = check(&ctx("I couldn't find that order number, could you double-check it?", &results, &state));
        assert!(v.is_pass());
    }
}
