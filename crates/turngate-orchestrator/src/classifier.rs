//! Classifier + Router, classifier half (§4.9). A small deterministic
//! pattern classifier — the same style as `turngate_llm::anchor_change` and
//! `turngate_guardrails::patterns`: no ML model, just named regexes, kept
//! narrow and auditable.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use turngate_core::{fields::canonical_name, FlowStatus, TurnState};

/// A coarse message-type tag (§4.9's `{type, confidence, extractedSlots}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    OrderStatus,
    Complaint,
    DebtInquiry,
    CallbackRequest,
    Chatter,
    Other,
}

impl MessageType {
    pub fn as_flow_tag(&self) -> Option<&'static str> {
        match self {
            MessageType::OrderStatus => Some("ORDER_STATUS"),
            MessageType::Complaint => Some("COMPLAINT"),
            MessageType::DebtInquiry => Some("DEBT_INQUIRY"),
            MessageType::CallbackRequest => Some("CALLBACK_REQUEST"),
            MessageType::Chatter | MessageType::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub message_type: MessageType,
    pub confidence: f32,
    pub extracted_slots: HashMap<String, String>,
}

static ORDER_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bORD[-_]?\d{4}[-_]?\d+\b").expect("valid regex"));
static PHONE_LAST4_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").expect("valid regex"));
static COMPLAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(complaint|şikayet|memnun değilim|sorun yaşıyorum|problem with)\b").expect("valid regex")
});
static DEBT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(debt|borcum|owe|invoice balance|fatura borcu)\b").expect("valid regex")
});
static CALLBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(call me back|beni arayın|callback|geri arama)\b").expect("valid regex")
});
static CHATTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|merhaba|selam|thanks|teşekkür|ok|tamam)\W*\s*$").expect("valid regex")
});

/// §4.9: the classifier runs only when the conversation already has an
/// in-flight flow, or verification is pending (so a bare verification
/// answer like "5089" or a name isn't mistaken for a fresh intent). A brand
/// new `idle` turn with no pending verification skips straight to the LLM.
pub fn should_run(state: &TurnState) -> bool {
    if matches!(state.verification.status, turngate_core::VerificationStatus::Pending) {
        return true;
    }
    matches!(
        state.flow_status,
        FlowStatus::InProgress
            | FlowStatus::Resolved
            | FlowStatus::PostResult
            | FlowStatus::NotFound
            | FlowStatus::ValidationError
    )
}

/// Classify a user message. Slot extraction always runs (cheap, regex-only);
/// the caller decides whether to merge slots into state based on whether
/// verification is pending (§4.9 — merging would corrupt a phone_last_4
/// answer into looking like an `order_number`).
pub fn classify(user_message: &str) -> Classification {
    let mut slots = HashMap::new();

    if let Some(m) = ORDER_NUMBER_RE.find(user_message) {
        slots.insert("order_number".to_string(), m.as_str().to_uppercase());
    }

    let (message_type, confidence) = if CHATTER_RE.is_match(user_message) {
        (MessageType::Chatter, 0.95)
    } else if COMPLAINT_RE.is_match(user_message) {
        (MessageType::Complaint, 0.8)
    } else if DEBT_RE.is_match(user_message) {
        (MessageType::DebtInquiry, 0.8)
    } else if CALLBACK_RE.is_match(user_message) {
        (MessageType::CallbackRequest, 0.8)
    } else if slots.contains_key("order_number") {
        (MessageType::OrderStatus, 0.7)
    } else {
        (MessageType::Other, 0.3)
    };

    Classification { message_type, confidence, extracted_slots: slots }
}

/// The verification-input case: the classifier still runs (to catch a new
/// order number mentioned mid-verification) but the caller must not merge
/// slots into `extracted_slots`/`collected_slots` — only read
/// `verification_input` out of the raw message text instead.
pub fn extract_verification_input(user_message: &str) -> Option<String> {
    let trimmed = user_message.trim();
    if let Some(m) = PHONE_LAST4_RE.find(trimmed) {
        if m.as_str().len() == trimmed.chars().filter(|c| c.is_ascii_digit()).count() {
            return Some(m.as_str().to_string());
        }
    }
    if !trimmed.is_empty() && trimmed.split_whitespace().count() <= 6 {
        return Some(trimmed.to_string());
    }
    None
}

/// Merge extracted slots into state's `extracted_slots`, canonicalizing
/// every key first (§6) — never called when verification is pending.
pub fn merge_slots(state: &mut TurnState, slots: &HashMap<String, String>) {
    for (k, v) in slots {
        state.extracted_slots.insert(canonical_name(k).to_string(), v.clone());
    }
}
