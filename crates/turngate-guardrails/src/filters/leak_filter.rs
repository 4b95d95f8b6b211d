use turngate_core::{redact::mask_phone, GuardrailVerdict, VerificationStatus};

use crate::catalog;
use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "leak_filter";

/// Filter 4 (§4.11), deliberately narrow scope: (a) internal/technical
/// identifier patterns (NEVER_EXPOSE) → BLOCK; (b) a bare phone number when
/// verification isn't `verified` → SANITIZE by masking, never by turning it
/// into a verification prompt (that would loop the conversation).
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if patterns::has_never_expose_identifier(ctx.response) {
        return GuardrailVerdict::block(NAME, catalog::internal_leak_block(ctx.language));
    }

    if ctx.state.verification.status != VerificationStatus::Verified {
        if let Some(phone) = patterns::find_phone(ctx.response) {
            let masked = ctx.response.replacen(phone, &mask_phone(phone), 1);
            return GuardrailVerdict::sanitize(NAME, masked);
        }
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
    fn blocks_internal_identifier_leak() {
        let state = TurnState::default();
        let v = check(&ctx("Internal record id is conv_abc123", &state));
        assert!(!v.is_pass());
        assert_eq!(v.final_response.as_deref().unwrap(), catalog::internal_leak_block("en"));
    }

    #[test]
    fn masks_phone_when_unverified() {
        let state = TurnState::default();
        let v = check(&ctx("We'll call you at +1 424 527 5089 shortly.", &state));
        assert!(!v.is_pass());
        assert!(v.final_response.unwrap().contains("+1******5089"));
    }

    #[test]
    fn allows_phone_when_verified() {
        let mut state = TurnState::default();
        state.verification.status = VerificationStatus::Verified;
        let v = check(&ctx("We'll call you at +1 424 527 5089 shortly.", &state));
        assert!(v.is_pass());
    }
}
