//! Orchestrator-level wiring around `turngate_identity` (§4.5–§4.7, §4.12).
//! Tools receive the turn state read-only, so the two identity steps that
//! need to mutate it — stashing the anchor the first time a tool returns
//! `VERIFICATION_REQUIRED`, and matching a verification answer against it —
//! live here rather than inside any `Tool` impl.

use turngate_core::{Outcome, StateEvent, ToolResult, TurnState};
use turngate_identity::verification::{create_anchor, verify_against_anchor};

/// Convention for a `VERIFICATION_REQUIRED` tool result's `data`: the source
/// record plus three flat string fields (`anchor_type`, `value`,
/// `source_table`) a tool includes alongside it. `create_anchor` already
/// extracts identity fields generically from whatever JSON object it's
/// given, so the same `data` value doubles as both the record and the
/// anchor-metadata carrier.
pub fn capture_anchor_if_needed(state: &mut TurnState, results: &[ToolResult]) {
    if state.anchor.is_some() {
        return;
    }
    for result in results {
        if result.outcome != Outcome::VerificationRequired {
            continue;
        }
        let Some(data) = &result.data else { continue };
        let (Some(anchor_type), Some(value), Some(source_table)) = (
            data.get("anchor_type").and_then(|v| v.as_str()),
            data.get("value").and_then(|v| v.as_str()),
            data.get("source_table").and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        state.anchor = Some(create_anchor(data, anchor_type, value, source_table));
        state.verification.status = turngate_core::VerificationStatus::Pending;
        return;
    }
}

/// Check a candidate verification answer against the stashed anchor
/// (§4.7). Returns a synthetic `ToolResult` carrying the matching
/// `StateEvent` so the caller can run it through
/// `outcome_contract::apply_state_events` alongside any real tool results,
/// keeping the verification FSM transition in one place.
pub fn check_verification_input(state: &TurnState, input: &str) -> Option<ToolResult> {
    let anchor = state.anchor.as_ref()?;
    match verify_against_anchor(anchor, input) {
        Some(_matched) => Some(
            ToolResult::new("verification", Outcome::Ok, "identity verified")
                .with_state_event(StateEvent::VerificationPassed),
        ),
        None => Some(
            ToolResult::new("verification", Outcome::VerificationRequired, "identity mismatch")
                .with_state_event(StateEvent::VerificationFailed),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification_required_result() -> ToolResult {
        ToolResult::new("order_status", Outcome::VerificationRequired, "please verify")
            .with_data(serde_json::json!({
                "id": "a1",
                "customer_id": "c1",
                "phone": "+14245275089",
                "anchor_type": "order",
                "value": "ORD-2024-001",
                "source_table": "orders",
            }))
            .with_identity_context("order_status")
    }

    #[test]
    fn first_verification_required_result_stashes_anchor() {
        let mut state = TurnState::default();
        capture_anchor_if_needed(&mut state, &[verification_required_result()]);
        let anchor = state.anchor.expect("anchor should be set");
        assert_eq!(anchor.value, "ORD-2024-001");
        assert_eq!(anchor.source_table, "orders");
        assert!(matches!(state.verification.status, turngate_core::VerificationStatus::Pending));
    }

    #[test]
    fn existing_anchor_is_never_overwritten() {
        let mut state = TurnState::default();
        capture_anchor_if_needed(&mut state, &[verification_required_result()]);
        let first = state.anchor.clone();
        capture_anchor_if_needed(&mut state, &[verification_required_result()]);
        assert_eq!(state.anchor.map(|a| a.value), first.map(|a| a.value));
    }

    #[test]
    fn matching_phone_last_4_passes() {
        let mut state = TurnState::default();
        capture_anchor_if_needed(&mut state, &[verification_required_result()]);
        let result = check_verification_input(&state, "5089").unwrap();
        assert_eq!(result.outcome, Outcome::Ok);
        assert_eq!(result.state_events, vec![StateEvent::VerificationPassed]);
    }

    #[test]
    fn mismatched_answer_fails() {
        let mut state = TurnState::default();
        capture_anchor_if_needed(&mut state, &[verification_required_result()]);
        let result = check_verification_input(&state, "0000").unwrap();
        assert_eq!(result.outcome, Outcome::VerificationRequired);
        assert_eq!(result.state_events, vec![StateEvent::VerificationFailed]);
    }

    #[test]
    fn no_anchor_yields_no_result() {
        let state = TurnState::default();
        assert!(check_verification_input(&state, "5089").is_none());
    }
}
