//! Identity Proof (§4.5): derive STRONG/WEAK/NONE from channel signals.

use serde::{Deserialize, Serialize};
use turngate_core::Channel;

use crate::lookup::IdentityLookup;
use crate::phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofStrength {
    Strong,
    Weak,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProof {
    pub strength: ProofStrength,
    pub matched_customer_id: Option<String>,
    pub matched_order_id: Option<String>,
    pub reasons: Vec<String>,
    pub duration_ms: u64,
}

impl IdentityProof {
    fn none(reason: impl Into<String>) -> Self {
        Self {
            strength: ProofStrength::None,
            matched_customer_id: None,
            matched_order_id: None,
            reasons: vec![reason.into()],
            duration_ms: 0,
        }
    }

    /// §4.6 Autoverify precondition 2+3: strength is STRONG AND the proof's
    /// matched customer equals the anchor's customer.
    pub fn matches_anchor_customer(&self, anchor_customer_id: Option<&str>) -> bool {
        self.strength == ProofStrength::Strong
            && self.matched_customer_id.is_some()
            && anchor_customer_id.is_some()
            && self.matched_customer_id.as_deref() == anchor_customer_id
    }

    /// §4.5 decision rule: STRONG skips the second factor, WEAK/NONE require it.
    pub fn requires_second_factor(&self) -> bool {
        self.strength != ProofStrength::Strong
    }
}

/// Channel-specific context available when deriving a proof.
pub enum ChannelContext<'a> {
    Chat,
    Whatsapp { sender_phone: &'a str },
    Email { sender_email: &'a str },
    Phone { caller_number: &'a str },
}

/// Derive an `IdentityProof` from channel possession signals. Any lookup
/// failure fails closed to `NONE` (§4.5) — a broken backend must never be
/// read as a positive identity signal.
pub async fn derive_identity_proof(
    ctx: &ChannelContext<'_>,
    lookup: &dyn IdentityLookup,
) -> IdentityProof {
    let started = std::time::Instant::now();
    let mut proof = match derive_inner(ctx, lookup).await {
        Ok(p) => p,
        Err(reason) => IdentityProof::none(reason),
    };
    proof.duration_ms = started.elapsed().as_millis() as u64;
    proof
}

async fn derive_inner(
    ctx: &ChannelContext<'_>,
    lookup: &dyn IdentityLookup,
) -> Result<IdentityProof, String> {
    match ctx {
        ChannelContext::Chat => Ok(IdentityProof::none("anonymous chat channel carries no possession signal")),
        ChannelContext::Phone { .. } => {
            Ok(IdentityProof::none("phone channel proof derivation not enabled"))
        }
        ChannelContext::Whatsapp { sender_phone } => {
            let variants = phone::variants(sender_phone);
            let customers = lookup.customers_by_phone(&variants).await?;

            if customers.len() == 1 {
                return Ok(IdentityProof {
                    strength: ProofStrength::Strong,
                    matched_customer_id: Some(customers[0].customer_id.clone()),
                    matched_order_id: None,
                    reasons: vec!["unique customer match by phone variants".to_string()],
                    duration_ms: 0,
                });
            }
            if customers.is_empty() && lookup.customer_table_is_empty().await? {
                let orders = lookup.orders_by_phone(&variants).await?;
                if orders.len() == 1 {
                    return Ok(IdentityProof {
                        strength: ProofStrength::Strong,
                        matched_customer_id: Some(orders[0].customer_id.clone()),
                        matched_order_id: Some(orders[0].order_id.clone()),
                        reasons: vec!["unique order match by phone variants (empty customer table)".to_string()],
                        duration_ms: 0,
                    });
                }
            }
            Ok(IdentityProof {
                strength: ProofStrength::Weak,
                matched_customer_id: None,
                matched_order_id: None,
                reasons: vec!["phone variants matched zero or multiple records".to_string()],
                duration_ms: 0,
            })
        }
        ChannelContext::Email { sender_email } => {
            let customers = lookup.customers_by_email(&sender_email.to_ascii_lowercase()).await?;
            if customers.len() == 1 {
                Ok(IdentityProof {
                    strength: ProofStrength::Strong,
                    matched_customer_id: Some(customers[0].customer_id.clone()),
                    matched_order_id: None,
                    reasons: vec!["unique customer match by email".to_string()],
                    duration_ms: 0,
                })
            } else {
                Ok(IdentityProof {
                    strength: ProofStrength::Weak,
                    matched_customer_id: None,
                    matched_order_id: None,
                    reasons: vec!["email matched zero or multiple customers".to_string()],
                    duration_ms: 0,
                })
            }
        }
    }
}

/// Derive the channel a proof should be computed for, from the core enum —
/// used by the orchestrator to decide whether proof derivation applies at
/// all before constructing a `ChannelContext`.
pub fn proof_applies_to(channel: Channel) -> bool {
    matches!(channel, Channel::Whatsapp | Channel::Email)
}
