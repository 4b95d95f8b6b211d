use turngate_core::{GuardrailVerdict, VerificationStatus};

use crate::catalog;
use crate::context::GuardrailContext;

const NAME: &str = "identity_match_check";

/// Filter 6 (§4.11): if any tool output carries a record owner and
/// `verifiedIdentity` is set, the owner's phone/email/customerId/orderId
/// must match the verified anchor on every requested sensitive field — any
/// mismatch is a hard deny, never a soft sanitize (an attacker who matched
/// one field and not another is actively probing).
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if ctx.state.verification.status != VerificationStatus::Verified {
        return GuardrailVerdict::pass(NAME);
    }
    let Some(anchor) = &ctx.state.anchor else {
        return GuardrailVerdict::pass(NAME);
    };

    for result in ctx.tool_results {
        let Some(data) = &result.data else { continue };
        let Some(owner_customer_id) = data.get("customer_id").and_then(|v| v.as_str()) else {
            continue;
        };
        if let Some(anchor_customer_id) = &anchor.customer_id {
            if owner_customer_id != anchor_customer_id {
                return GuardrailVerdict::block(NAME, catalog::identity_mismatch_block(ctx.language));
            }
        }
    }

    GuardrailVerdict::pass(NAME)
}
