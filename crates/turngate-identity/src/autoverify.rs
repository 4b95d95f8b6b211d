//! Autoverify Gate (§4.6): skip the second verification factor when channel
//! possession uniquely matches the anchor's customer.

use turngate_core::{IdentityContext, Outcome, StateEvent, ToolResult};

use crate::proof::IdentityProof;
use crate::verification::get_full_result;

/// A source-table refetch collaborator — re-fetches the full record by
/// anchor id once autoverify decides to upgrade the result (§4.6 "re-fetches
/// the full record by anchor.id from the declared sourceTable").
#[async_trait::async_trait]
pub trait AnchorRefetch: Send + Sync {
    async fn refetch(&self, source_table: &str, anchor_id: &str) -> Result<serde_json::Value, String>;
}

/// Apply the Autoverify Gate to a `VERIFICATION_REQUIRED` tool result.
///
/// All preconditions below are required; ANY failure leaves `result`
/// unchanged (fail-closed, §4.6):
/// 1. the business has the channel-proof feature flag enabled
/// 2. `proof.strength == STRONG`
/// 3. `proof.matched_customer_id == anchor.customer_id` (both present)
///
/// On success the result is overwritten to `OK` with a `VERIFICATION_PASSED`
/// event tagged `channel_proof`, carrying the freshly refetched full record.
pub async fn apply_autoverify(
    result: ToolResult,
    channel_proof_enabled: bool,
    proof: &IdentityProof,
    anchor_customer_id: Option<&str>,
    anchor_id: &str,
    source_table: &str,
    refetch: &dyn AnchorRefetch,
) -> ToolResult {
    if result.outcome != Outcome::VerificationRequired {
        return result;
    }
    let Some(IdentityContext { .. }) = &result.identity_context else {
        return result;
    };
    if !channel_proof_enabled {
        return result;
    }
    if !proof.matches_anchor_customer(anchor_customer_id) {
        return result;
    }

    match refetch.refetch(source_table, anchor_id).await {
        Ok(full_record) => {
            let mut upgraded = ToolResult::new(result.name.clone(), Outcome::Ok, "verified via channel proof")
                .with_data(get_full_result(&full_record))
                .with_state_event(StateEvent::VerificationPassed);
            upgraded.identity_context = None;
            upgraded
        }
        // Any error in the refetch -> original result retained (fail-closed).
        Err(_) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofStrength;

    struct FakeRefetch {
        data: serde_json::Value,
    }

    #[async_trait::async_trait]
    impl AnchorRefetch for FakeRefetch {
        async fn refetch(&self, _source_table: &str, _anchor_id: &str) -> Result<serde_json::Value, String> {
            Ok(self.data.clone())
        }
    }

    struct FailingRefetch;
    #[async_trait::async_trait]
    impl AnchorRefetch for FailingRefetch {
        async fn refetch(&self, _source_table: &str, _anchor_id: &str) -> Result<serde_json::Value, String> {
            Err("db down".into())
        }
    }

    fn strong_proof(customer_id: &str) -> IdentityProof {
        IdentityProof {
            strength: ProofStrength::Strong,
            matched_customer_id: Some(customer_id.to_string()),
            matched_order_id: None,
            reasons: vec![],
            duration_ms: 0,
        }
    }

    fn vr_result() -> ToolResult {
        ToolResult::new("order_status", Outcome::VerificationRequired, "needs verification")
            .with_identity_context("order_status")
    }

    #[tokio::test]
    async fn upgrades_to_ok_when_all_preconditions_hold() {
        let refetch = FakeRefetch { data: serde_json::json!({"status": "shipped"}) };
        let proof = strong_proof("c1");
        let out = apply_autoverify(vr_result(), true, &proof, Some("c1"), "a1", "orders", &refetch).await;
        assert_eq!(out.outcome, Outcome::Ok);
        assert!(out.state_events.contains(&StateEvent::VerificationPassed));
    }

    #[tokio::test]
    async fn flag_disabled_leaves_result_unchanged() {
        let refetch = FakeRefetch { data: serde_json::json!({}) };
        let proof = strong_proof("c1");
        let out = apply_autoverify(vr_result(), false, &proof, Some("c1"), "a1", "orders", &refetch).await;
        assert_eq!(out.outcome, Outcome::VerificationRequired);
    }

    #[tokio::test]
    async fn mismatched_customer_id_leaves_result_unchanged() {
        let refetch = FakeRefetch { data: serde_json::json!({}) };
        let proof = strong_proof("c1");
        let out = apply_autoverify(vr_result(), true, &proof, Some("c2"), "a1", "orders", &refetch).await;
        assert_eq!(out.outcome, Outcome::VerificationRequired);
    }

    #[tokio::test]
    async fn refetch_failure_is_fail_closed() {
        let proof = strong_proof("c1");
        let out = apply_autoverify(vr_result(), true, &proof, Some("c1"), "a1", "orders", &FailingRefetch).await;
        assert_eq!(out.outcome, Outcome::VerificationRequired);
    }

    #[tokio::test]
    async fn missing_identity_context_leaves_result_unchanged() {
        let refetch = FakeRefetch { data: serde_json::json!({}) };
        let proof = strong_proof("c1");
        let no_ctx = ToolResult::new("order_status", Outcome::VerificationRequired, "needs verification");
        let out = apply_autoverify(no_ctx, true, &proof, Some("c1"), "a1", "orders", &refetch).await;
        assert_eq!(out.outcome, Outcome::VerificationRequired);
    }
}
