use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Idle,
    InProgress,
    Resolved,
    PostResult,
    NotFound,
    ValidationError,
    Terminated,
}

impl Default for FlowStatus {
    fn default() -> Self {
        FlowStatus::Idle
    }
}

/// `none -> pending -> verified`, or `pending -> none` on failure (§4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    None,
    Pending,
    Verified,
}

impl Default for VerificationStatus {
    fn default() -> Self {
        VerificationStatus::None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationState {
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected: Option<String>,
    pub attempts: u32,
}

impl VerificationState {
    /// Anchor change (§4.10) or explicit reset restarts the FSM at `none`,
    /// discarding any prior verification — a new record must be re-proven.
    pub fn reset(&mut self) {
        self.status = VerificationStatus::None;
        self.anchor = None;
        self.collected = None;
        self.attempts = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseGrounding {
    Grounded,
    Clarification,
    OutOfScope,
}

/// Per-turn context the Leak Filter uses to suppress itself when a query
/// genuinely returned nothing — there is no sensitive record to protect
/// (§4.11 filter 3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastNotFound {
    pub occurred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
}

/// Versioned, persisted per-session turn state (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnState {
    pub flow_status: FlowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_flow: Option<String>,
    pub verification: VerificationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(default)]
    pub extracted_slots: HashMap<String, String>,
    #[serde(default)]
    pub collected_slots: HashMap<String, String>,
    #[serde(default)]
    pub last_not_found: LastNotFound,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_grounding: Option<ResponseGrounding>,
    /// Enumeration counter: distinct failed verification events this session.
    #[serde(default)]
    pub failed_verification_count: u32,
    /// Optimistic-concurrency version stamp, bumped on every persist.
    #[serde(default)]
    pub version: u64,
}

impl TurnState {
    /// Clears verification and rewrites the active flow/slot so a mention of
    /// a different order number never carries a prior verification forward
    /// (§4.10 "Special anchor-change handling").
    pub fn handle_anchor_change(&mut self, new_order_number: &str) {
        self.verification.reset();
        self.anchor = None;
        self.active_flow = Some("ORDER_STATUS".to_string());
        self.extracted_slots
            .insert("order_number".to_string(), new_order_number.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_change_clears_verification() {
        let mut s = TurnState::default();
        s.verification.status = VerificationStatus::Verified;
        s.verification.attempts = 2;
        s.handle_anchor_change("ORD-2024-002");
        assert!(matches!(s.verification.status, VerificationStatus::None));
        assert_eq!(s.verification.attempts, 0);
        assert_eq!(
            s.extracted_slots.get("order_number").map(String::as_str),
            Some("ORD-2024-002")
        );
        assert_eq!(s.active_flow.as_deref(), Some("ORDER_STATUS"));
    }
}
