//! Anchor-change detection (§4.10): if the user mentions an order number
//! distinct from the currently verified anchor's value, verification must be
//! reset before the tool loop runs so a prior verification can never be
//! carried over to a different record.

use once_cell::sync::Lazy;
use regex::Regex;
use turngate_core::TurnState;

static ORDER_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bORD[-_]?\d{4}[-_]?\d+\b").expect("valid regex"));

/// Returns the new order number if the user message names one that differs
/// from `state.anchor.value` (only relevant when an anchor is already set).
pub fn detect_anchor_change(user_message: &str, state: &TurnState) -> Option<String> {
    let found = ORDER_NUMBER_RE.find(user_message)?.as_str().to_uppercase();
    match &state.anchor {
        Some(anchor) if anchor.value.eq_ignore_ascii_case(&found) => None,
        _ => Some(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::Anchor;

    #[test]
    fn detects_new_order_number_with_no_prior_anchor() {
        let state = TurnState::default();
        assert_eq!(
            detect_anchor_change("ORD-2024-001 siparişimi sorgula", &state),
            Some("ORD-2024-001".to_string())
        );
    }

    #[test]
    fn ignores_message_naming_the_same_anchor() {
        let mut state = TurnState::default();
        state.anchor = Some(Anchor {
            id: "a1".into(),
            customer_id: None,
            name: None,
            phone: None,
            email: None,
            value: "ORD-2024-001".into(),
            anchor_type: "order".into(),
            source_table: "orders".into(),
        });
        assert_eq!(detect_anchor_change("ORD-2024-001 durumu nedir?", &state), None);
    }

    #[test]
    fn detects_distinct_order_number_from_prior_anchor() {
        let mut state = TurnState::default();
        state.anchor = Some(Anchor {
            id: "a1".into(),
            customer_id: None,
            name: None,
            phone: None,
            email: None,
            value: "ORD-2024-001".into(),
            anchor_type: "order".into(),
            source_table: "orders".into(),
        });
        assert_eq!(
            detect_anchor_change("Aslında ORD-2024-002'yi soruyorum", &state),
            Some("ORD-2024-002".to_string())
        );
    }

    #[test]
    fn no_order_number_mentioned_is_none() {
        let state = TurnState::default();
        assert_eq!(detect_anchor_change("merhaba nasılsınız", &state), None);
    }
}
