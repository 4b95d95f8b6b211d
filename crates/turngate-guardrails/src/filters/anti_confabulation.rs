use turngate_core::{CorrectionType, GuardrailVerdict};

use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "anti_confabulation";

/// Filter 9 (§4.11): event claims (delivery happened, package left with a
/// neighbor, refund processed, a specific date/time) must be backed by a
/// successful tool call this turn; availability claims may be backed by KB
/// context instead, so only unhedged event claims without a tool success
/// are flagged.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if !patterns::has_unbacked_event_claim(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }
    if ctx.had_tool_success {
        return GuardrailVerdict::pass(NAME);
    }
    GuardrailVerdict::need_correction(
        NAME,
        CorrectionType::Confabulation,
        "Do not assert that an event (delivery, handoff, refund) already happened unless a tool call this turn confirmed it. Hedge or ask instead.".to_string(),
    )
}
