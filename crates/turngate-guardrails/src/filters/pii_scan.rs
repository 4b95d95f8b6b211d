use turngate_core::{GuardrailVerdict, LockReason};

use crate::catalog;
use crate::context::GuardrailContext;
use crate::patterns;

const NAME: &str = "pii_prevention_scan";

/// Filter 2 (§4.11): scan outgoing text for critical PII patterns.
/// CRITICAL (a national ID / VKN appearing verbatim) locks the session;
/// HIGH (a bare phone number) is left to the Leak Filter to sanitize and is
/// only a warn-level telemetry signal here.
pub fn check(ctx: &GuardrailContext) -> GuardrailVerdict {
    if has_critical_pii(ctx.response) {
        return GuardrailVerdict::block_with_lock(
            NAME,
            catalog::pii_risk_lock(ctx.language),
            LockReason::PiiRisk,
        );
    }
    if patterns::find_phone(ctx.response).is_some() {
        tracing::warn!(filter = NAME, "high-severity PII pattern seen (phone), deferring to leak filter");
    }
    GuardrailVerdict::pass(NAME)
}

/// TC kimlik no (11 digits) or VKN (10 digits) appearing as a standalone
/// run of digits — these must never be echoed back under any circumstance.
fn has_critical_pii(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit())
        .any(|run| run.len() == 10 || run.len() == 11)
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
    fn locks_on_national_id_pattern() {
        let state = TurnState::default();
        let v = check(&ctx("Your TC number is 12345678901.", &state));
        assert!(!v.is_pass());
        assert_eq!(v.lock, Some(LockReason::PiiRisk));
    }

    #[test]
    fn passes_ordinary_text() {
        let state = TurnState::default();
        assert!(check(&ctx("Your order is on its way.", &state)).is_pass());
    }
}
