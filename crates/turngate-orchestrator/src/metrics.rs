//! Metrics + Telemetry (§4.14). Each turn produces one `SecurityTelemetry`
//! record plus a single structured `TURN_TELEMETRY` log line — one tag per
//! family, the same convention `turngate_guardrails::chain` uses for
//! `GUARDRAIL_VERDICT` so a downstream log pipeline can key on either.

use serde::Serialize;
use turngate_core::{GuardrailAction, Outcome, ResponseGrounding};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityTelemetry {
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub action: Option<String>,
    pub violations: Vec<String>,
    pub reprompt_count: u32,
    pub latency_ms: u64,
    pub injection_detected: bool,
    pub session_throttled: bool,
    pub feature_flags: std::collections::BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnTelemetry {
    pub security: SecurityTelemetry,
    pub kb_confidence: Option<f32>,
    pub entity_resolver: Option<String>,
    pub tools_called: Vec<String>,
    pub outcome: Outcome,
    pub response_grounding: Option<ResponseGrounding>,
}

impl SecurityTelemetry {
    pub fn record_guardrail(&mut self, action: GuardrailAction, filter: &str) {
        self.action = Some(format!("{action:?}"));
        if matches!(action, GuardrailAction::Block) {
            self.blocked = true;
            self.block_reason = Some(filter.to_string());
        }
        if !matches!(action, GuardrailAction::Pass) {
            self.violations.push(filter.to_string());
        }
    }

    pub fn record_reprompt(&mut self) {
        self.reprompt_count += 1;
    }
}

/// Emits the single structured `TURN_TELEMETRY` log line this turn (§4.14).
/// Callers build `TurnTelemetry` once, at the end of `handle_incoming_message`.
pub fn emit(turn_id: &str, session_id: &str, telemetry: &TurnTelemetry) {
    tracing::info!(
        turn_id,
        session_id,
        blocked = telemetry.security.blocked,
        block_reason = telemetry.security.block_reason.as_deref(),
        action = telemetry.security.action.as_deref(),
        violations = ?telemetry.security.violations,
        reprompt_count = telemetry.security.reprompt_count,
        latency_ms = telemetry.security.latency_ms,
        injection_detected = telemetry.security.injection_detected,
        session_throttled = telemetry.security.session_throttled,
        kb_confidence = telemetry.kb_confidence,
        tools_called = ?telemetry.tools_called,
        outcome = %telemetry.outcome,
        response_grounding = ?telemetry.response_grounding,
        "TURN_TELEMETRY"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_action_sets_blocked_and_reason() {
        let mut telemetry = SecurityTelemetry::default();
        telemetry.record_guardrail(GuardrailAction::Block, "leak_filter");
        assert!(telemetry.blocked);
        assert_eq!(telemetry.block_reason.as_deref(), Some("leak_filter"));
        assert_eq!(telemetry.violations, vec!["leak_filter".to_string()]);
    }

    #[test]
    fn pass_action_does_not_add_violation() {
        let mut telemetry = SecurityTelemetry::default();
        telemetry.record_guardrail(GuardrailAction::Pass, "chain");
        assert!(!telemetry.blocked);
        assert!(telemetry.violations.is_empty());
    }

    #[test]
    fn reprompt_counter_accumulates() {
        let mut telemetry = SecurityTelemetry::default();
        telemetry.record_reprompt();
        telemetry.record_reprompt();
        assert_eq!(telemetry.reprompt_count, 2);
    }
}
