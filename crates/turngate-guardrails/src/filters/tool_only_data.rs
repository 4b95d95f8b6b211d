use once_cell::sync::Lazy;
use regex::Regex;
use turngate_core::{CorrectionType, GuardrailVerdict};

use crate::context::GuardrailContext;

const NAME: &str = "tool_only_data_guard";

/// Data shapes that only a tool result can legitimately have produced:
/// tracking numbers, order statuses, street-address fragments.
static DATA_CLAIM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(tracking number|kargo takip|order status is|sipariş durumu|shipped to|teslimat adresi|\b[A-Z]{2}\d{9,}[A-Z]{0,2}\b)",
    )
    .expect("valid regex")
});

/// Filter 7 (§4.11): a response may only assert status/tracking/address data
/// if a successful tool call actually produced it this turn.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if !DATA_CLAIM_RE.is_match(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }
    if ctx.had_tool_success {
        return GuardrailVerdict::pass(NAME);
    }
    GuardrailVerdict::need_correction(
        NAME,
        CorrectionType::ToolOnlyDataLeak,
        "Do not state any order status, tracking number, or address detail unless it came from a tool result returned this turn.".to_string(),
    )
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
    fn passes_plain_chatter() {
        let state = TurnState::default();
        assert!(check(&ctx("Happy to help!", false, &state)).is_pass());
    }

    #[test]
    fn requests_correction_for_unbacked_tracking_claim() {
        let state = TurnState::default();
        let v = check(&ctx("Your tracking number is AB123456789TR.", false, &state));
        assert!(!v.is_pass());
    }

    #[test]
    fn passes_when_backed_by_a_successful_tool() {
        let state = TurnState::default();
        assert!(check(&ctx("Your tracking number is AB123456789TR.", true, &state)).is_pass());
    }
}
