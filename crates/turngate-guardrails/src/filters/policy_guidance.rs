use turngate_core::GuardrailVerdict;

use crate::catalog;
use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "policy_guidance_post_pass";

/// Filter 11 (§4.11), deterministic: if the user asked about a policy topic
/// (refund/return/cancel) and the response lacks the actionable-guidance
/// components (a timeframe, a next step), append them. Always the last
/// filter in the chain — nothing downstream re-checks its own addition.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if !patterns::is_policy_topic(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }
    if patterns::has_policy_guidance(ctx.response) {
        return GuardrailVerdict::pass(NAME);
    }
    let augmented = format!("{}{}", ctx.response, catalog::policy_guidance_suffix(ctx.language));
    GuardrailVerdict::sanitize(NAME, augmented)
}
