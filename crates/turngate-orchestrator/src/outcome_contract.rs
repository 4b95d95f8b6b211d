//! Outcome Contract (§4.4): normalization is owned by `turngate_core::Outcome`
//! already; what's left here is consuming a turn's `stateEvents` to drive the
//! verification FSM and enumeration counter, and deriving the turn's single
//! final outcome from tool + guardrail signals.

use turngate_core::{GuardrailAction, GuardrailVerdict, LockReason, Outcome, StateEvent, ToolResult, TurnState, VerificationStatus};

/// Apply every `stateEvent` emitted by this turn's tool results to the turn
/// state's verification FSM (§4.14 state machine):
/// `none -> pending` happens when a tool first returns `VERIFICATION_REQUIRED`
/// and stashes an anchor (the caller does that before this runs); this
/// function only consumes the terminal pass/fail events a tool attaches once
/// the user has supplied a verification answer.
///
/// Three distinct failed-verification events within a session lock
/// `ENUMERATION` (§8); a passed event resets the counter.
pub fn apply_state_events(state: &mut TurnState, results: &[ToolResult], enumeration_threshold: u32) -> Option<LockReason> {
    for result in results {
        for event in &result.state_events {
            match event {
                StateEvent::VerificationPassed => {
                    state.verification.status = VerificationStatus::Verified;
                    state.failed_verification_count = 0;
                }
                StateEvent::VerificationFailed => {
                    state.verification.status = VerificationStatus::None;
                    state.verification.attempts += 1;
                    state.failed_verification_count += 1;
                    if state.failed_verification_count >= enumeration_threshold {
                        return Some(LockReason::Enumeration);
                    }
                }
            }
        }
    }
    None
}

/// Derive the turn's single final outcome (§4.4): explicit tool terminal
/// state takes priority over the highest-priority tool outcome, which in
/// turn takes priority over a guardrail verdict's implicit override (a
/// `BLOCK` always reads as `DENIED` to the caller, regardless of what the
/// tools returned, since the user never actually sees the tools' data).
pub fn derive_final_outcome(
    terminal_outcome: Option<Outcome>,
    tool_results: &[ToolResult],
    guardrail: &GuardrailVerdict,
) -> Outcome {
    if let Some(terminal) = terminal_outcome {
        return terminal;
    }
    if matches!(guardrail.action, GuardrailAction::Block) {
        return Outcome::Denied;
    }
    Outcome::pick_highest_priority(tool_results.iter().map(|r| r.outcome)).unwrap_or(Outcome::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_failed_verifications_lock_enumeration() {
        let mut state = TurnState::default();
        let fail = ToolResult::new("order_status", Outcome::VerificationRequired, "no match")
            .with_state_event(StateEvent::VerificationFailed);

        assert!(apply_state_events(&mut state, &[fail.clone()], 3).is_none());
        assert!(apply_state_events(&mut state, &[fail.clone()], 3).is_none());
        let lock = apply_state_events(&mut state, &[fail], 3);
        assert_eq!(lock, Some(LockReason::Enumeration));
    }

    #[test]
    fn successful_verification_resets_counter() {
        let mut state = TurnState::default();
        state.failed_verification_count = 2;
        let pass = ToolResult::new("order_status", Outcome::Ok, "matched")
            .with_state_event(StateEvent::VerificationPassed);
        apply_state_events(&mut state, &[pass], 3);
        assert_eq!(state.failed_verification_count, 0);
        assert!(matches!(state.verification.status, VerificationStatus::Verified));
    }

    #[test]
    fn guardrail_block_overrides_to_denied() {
        let verdict = GuardrailVerdict::block("leak_filter", "no");
        let outcome = derive_final_outcome(None, &[ToolResult::new("t", Outcome::Ok, "ok")], &verdict);
        assert_eq!(outcome, Outcome::Denied);
    }

    #[test]
    fn terminal_outcome_wins_over_everything() {
        let verdict = GuardrailVerdict::pass("chain");
        let outcome = derive_final_outcome(
            Some(Outcome::VerificationRequired),
            &[ToolResult::new("t", Outcome::Ok, "ok")],
            &verdict,
        );
        assert_eq!(outcome, Outcome::VerificationRequired);
    }

    #[test]
    fn falls_back_to_highest_priority_tool_outcome() {
        let verdict = GuardrailVerdict::pass("chain");
        let results = vec![ToolResult::new("t", Outcome::NotFound, "no row")];
        assert_eq!(derive_final_outcome(None, &results, &verdict), Outcome::NotFound);
    }
}
