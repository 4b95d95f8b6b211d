// End-to-end identity pipeline scenarios (spec §8): anchor construction,
// the verification prompt decision, matching attempts in their documented
// order, and the autoverify gate's preconditions, exercised together the
// way the orchestrator composes them across a turn.

use async_trait::async_trait;
use turngate_identity::{
    apply_autoverify, check_verification, create_anchor, derive_identity_proof, get_full_result,
    verify_against_anchor, AnchorRefetch, ChannelContext, CustomerMatch, IdentityLookup, MatchedField,
    OrderMatch, ProofStrength, VerificationPrompt,
};

struct FakeLookup {
    customers: Vec<CustomerMatch>,
    orders: Vec<OrderMatch>,
    customer_table_empty: bool,
}

#[async_trait]
impl IdentityLookup for FakeLookup {
    async fn customers_by_phone(&self, _variants: &[String]) -> Result<Vec<CustomerMatch>, String> {
        Ok(self.customers.clone())
    }
    async fn orders_by_phone(&self, _variants: &[String]) -> Result<Vec<OrderMatch>, String> {
        Ok(self.orders.clone())
    }
    async fn customers_by_email(&self, _email: &str) -> Result<Vec<CustomerMatch>, String> {
        Ok(self.customers.clone())
    }
    async fn customer_table_is_empty(&self) -> Result<bool, String> {
        Ok(self.customer_table_empty)
    }
}

struct FakeRefetch {
    record: serde_json::Value,
}

#[async_trait]
impl AnchorRefetch for FakeRefetch {
    async fn refetch(&self, _source_table: &str, _anchor_id: &str) -> Result<serde_json::Value, String> {
        Ok(self.record.clone())
    }
}

#[test]
fn anchor_built_from_located_record_carries_only_identity_fields() {
    let record = serde_json::json!({
        "id": "ord_1",
        "customer_id": "cust_1",
        "customer_name": "Ahmet Yılmaz",
        "phone": "+905551234567",
        "total_amount_cents": 129900,
        "internal_notes": "flagged for fraud review",
    });
    let anchor = create_anchor(&record, "order", "ORD-2024-001", "orders");

    assert_eq!(anchor.id, "ord_1");
    assert_eq!(anchor.customer_id.as_deref(), Some("cust_1"));
    assert_eq!(anchor.name.as_deref(), Some("Ahmet Yılmaz"));
    assert_eq!(anchor.value, "ORD-2024-001");
    assert_eq!(anchor.source_table, "orders");
}

#[test]
fn scenario_unverified_user_is_asked_for_phone_last4_first() {
    let record = serde_json::json!({"id": "ord_1", "customer_name": "Ahmet Yılmaz", "phone": "+905551234567"});
    let anchor = create_anchor(&record, "order", "ORD-2024-001", "orders");

    assert_eq!(check_verification(&anchor, None), Err(VerificationPrompt::PhoneLast4));
}

#[test]
fn scenario_correct_full_name_satisfies_verification() {
    let record = serde_json::json!({"id": "ord_1", "customer_name": "Ahmet Yılmaz", "phone": "+905551234567"});
    let anchor = create_anchor(&record, "order", "ORD-2024-001", "orders");

    assert_eq!(verify_against_anchor(&anchor, "Ahmet Yılmaz"), Some(MatchedField::Name));
}

#[test]
fn scenario_wrong_name_does_not_match_any_field() {
    let record = serde_json::json!({"id": "ord_1", "customer_name": "Ahmet Yılmaz", "phone": "+905551234567"});
    let anchor = create_anchor(&record, "order", "ORD-2024-001", "orders");

    assert_eq!(verify_against_anchor(&anchor, "Mehmet Demir"), None);
}

#[tokio::test]
async fn scenario_whatsapp_unique_customer_match_yields_strong_proof_for_autoverify() {
    let lookup = FakeLookup {
        customers: vec![CustomerMatch { customer_id: "cust_1".into() }],
        orders: vec![],
        customer_table_empty: false,
    };
    let ctx = ChannelContext::Whatsapp { sender_phone: "+14245275089" };
    let proof = derive_identity_proof(&ctx, &lookup).await;

    assert_eq!(proof.strength, ProofStrength::Strong);
    assert_eq!(proof.matched_customer_id.as_deref(), Some("cust_1"));

    // Fed into the autoverify gate with a matching anchor customer id, the
    // VERIFICATION_REQUIRED result upgrades to OK without a second factor.
    let record = serde_json::json!({"id": "ord_1", "customer_id": "cust_1", "status": "shipped"});
    let anchor = create_anchor(&record, "order", "ORD-2024-001", "orders");
    let vr = turngate_core::ToolResult::new(
        "order_status",
        turngate_core::Outcome::VerificationRequired,
        "needs verification",
    )
    .with_identity_context("order_status");
    let refetch = FakeRefetch { record: record.clone() };

    let upgraded = apply_autoverify(
        vr,
        true,
        &proof,
        anchor.customer_id.as_deref(),
        &anchor.id,
        &anchor.source_table,
        &refetch,
    )
    .await;

    assert_eq!(upgraded.outcome, turngate_core::Outcome::Ok);
}

#[tokio::test]
async fn scenario_multiple_customers_on_one_phone_yields_weak_proof() {
    let lookup = FakeLookup {
        customers: vec![
            CustomerMatch { customer_id: "cust_1".into() },
            CustomerMatch { customer_id: "cust_2".into() },
        ],
        orders: vec![],
        customer_table_empty: false,
    };
    let ctx = ChannelContext::Whatsapp { sender_phone: "+14245275089" };
    let proof = derive_identity_proof(&ctx, &lookup).await;

    assert_eq!(proof.strength, ProofStrength::Weak);
}

#[test]
fn full_result_redacts_even_after_successful_verification() {
    let data = serde_json::json!({
        "phone": "+905551234567",
        "email": "ahmet.yilmaz@example.com",
        "tc": "12345678901",
        "status": "shipped",
    });
    let redacted = get_full_result(&data);

    assert_eq!(redacted["phone"], "+90******4567");
    assert_eq!(redacted["status"], "shipped");
    assert_ne!(redacted["tc"], data["tc"]);
}
