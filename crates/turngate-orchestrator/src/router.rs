//! Classifier + Router, router half (§4.9). Consumes a `Classification`
//! plus the turn's current state and decides whether the orchestrator can
//! short-circuit with a canned chatter acknowledgement (context only — never
//! returned verbatim, since even "ok thanks" still has to pass the guardrail
//! chain) or must hand the turn to the LLM tool loop tagged with an intent.

use crate::classifier::{Classification, MessageType};
use turngate_core::TurnState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Respond with a short acknowledgement; still passes through the full
    /// guardrail chain as any other reply would, so this is a hint, not a
    /// bypass.
    ChatterAck,
    /// Hand off to the LLM tool loop with the named intent tag set as
    /// `RUN_INTENT_ROUTER` context so the system prompt can steer tool
    /// selection.
    RunIntentRouter { intent: String },
}

pub fn route(classification: &Classification, state: &TurnState) -> RouteDecision {
    if classification.message_type == MessageType::Chatter && state.active_flow.is_none() {
        return RouteDecision::ChatterAck;
    }
    let intent = classification
        .message_type
        .as_flow_tag()
        .map(str::to_string)
        .or_else(|| state.active_flow.clone())
        .unwrap_or_else(|| "GENERAL".to_string());
    RouteDecision::RunIntentRouter { intent }
}
