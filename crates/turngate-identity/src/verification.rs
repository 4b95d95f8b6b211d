//! Verification Service (§4.7): anchor construction, verification-input
//! matching, and minimal-vs-full result shaping with PII redaction.

use serde::{Deserialize, Serialize};
use turngate_core::{redact, Anchor};

use crate::phone;
use crate::turkish::compare_turkish_names;

/// §4.7: every query type requires verification — there is no PII-free path.
pub fn requires_verification(_query_type: &str) -> bool {
    true
}

/// Copy only identity-relevant fields out of a source record into an anchor
/// (§4.7, §9 "cyclic references"). `record` is whatever JSON shape the tool
/// that located the record produced; only the fields below are lifted.
pub fn create_anchor(
    record: &serde_json::Value,
    anchor_type: &str,
    value: &str,
    source_table: &str,
) -> Anchor {
    let get_str = |key: &str| record.get(key).and_then(|v| v.as_str()).map(str::to_string);
    Anchor {
        id: get_str("id").unwrap_or_else(|| value.to_string()),
        customer_id: get_str("customer_id"),
        name: get_str("name").or_else(|| get_str("customer_name")),
        phone: get_str("phone"),
        email: get_str("email"),
        value: value.to_string(),
        anchor_type: anchor_type.to_string(),
        source_table: source_table.to_string(),
    }
}

/// What the pipeline must ask the user for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPrompt {
    PhoneLast4,
    FullName,
}

/// If no verification input has been collected yet, decide what to ask for:
/// phone last 4 is preferred; full name is the fallback when the anchor
/// carries no phone at all (§4.7).
pub fn check_verification(anchor: &Anchor, input: Option<&str>) -> Result<(), VerificationPrompt> {
    if input.is_some() {
        return Ok(());
    }
    if anchor.phone.is_some() {
        Err(VerificationPrompt::PhoneLast4)
    } else {
        Err(VerificationPrompt::FullName)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    PhoneLast4,
    Name,
    FullPhone,
}

/// Ordered attempts against the anchor (§4.7):
/// 1. exactly 4 digits -> phone_last4
/// 2. else Turkish-aware name comparison
/// 3. else >=10 digits -> full E.164 phone compare
pub fn verify_against_anchor(anchor: &Anchor, input: &str) -> Option<MatchedField> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 4 {
        if let Some(stored) = &anchor.phone {
            if phone::last4(stored).as_deref() == Some(digits.as_str()) {
                return Some(MatchedField::PhoneLast4);
            }
        }
        return None;
    }

    if let Some(stored_name) = &anchor.name {
        if compare_turkish_names(input, stored_name) {
            return Some(MatchedField::Name);
        }
    }

    if digits.len() >= 10 {
        if let Some(stored) = &anchor.phone {
            if phone_matches_flexible(stored, &digits) {
                return Some(MatchedField::FullPhone);
            }
        }
    }

    None
}

/// E.164 compare tolerant of +90/+1 country-code folding and leading zeros.
fn phone_matches_flexible(stored: &str, input_digits: &str) -> bool {
    let stored_e164 = phone::to_e164(stored);
    let input_e164 = phone::to_e164(input_digits);
    if stored_e164 == input_e164 {
        return true;
    }
    let strip_cc = |s: &str| -> String {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        digits
            .strip_prefix("90")
            .or_else(|| digits.strip_prefix('1'))
            .unwrap_or(&digits)
            .trim_start_matches('0')
            .to_string()
    };
    strip_cc(&stored_e164) == strip_cc(&input_e164)
}

/// Coarse status only — used when verification has not yet succeeded.
pub fn get_minimal_result(status: &str) -> serde_json::Value {
    serde_json::json!({ "status": status })
}

/// Apply PII redaction to the full record before it is ever attached to a
/// tool result, even after successful verification (§4.7) — redaction
/// happens unconditionally, not as a function of verification state.
pub fn get_full_result(data: &serde_json::Value) -> serde_json::Value {
    redact::redact_json(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor_with_phone(phone: &str) -> Anchor {
        Anchor {
            id: "a1".into(),
            customer_id: Some("c1".into()),
            name: Some("Ahmet Yılmaz".into()),
            phone: Some(phone.to_string()),
            email: None,
            value: "ORD-1".into(),
            anchor_type: "order".into(),
            source_table: "orders".into(),
        }
    }

    #[test]
    fn phone_last4_match() {
        let anchor = anchor_with_phone("+14245275089");
        assert_eq!(verify_against_anchor(&anchor, "5089"), Some(MatchedField::PhoneLast4));
    }

    #[test]
    fn phone_last4_miss() {
        let anchor = anchor_with_phone("+14245275089");
        assert_eq!(verify_against_anchor(&anchor, "1234"), None);
    }

    #[test]
    fn name_match_falls_through_after_digit_check() {
        let anchor = anchor_with_phone("+905551234567");
        assert_eq!(
            verify_against_anchor(&anchor, "Ahmet Yılmaz"),
            Some(MatchedField::Name)
        );
    }

    #[test]
    fn full_phone_match_with_country_code_folding() {
        let anchor = anchor_with_phone("+905551234567");
        assert_eq!(
            verify_against_anchor(&anchor, "905551234567"),
            Some(MatchedField::FullPhone)
        );
    }

    #[test]
    fn check_verification_prefers_phone_last4() {
        let anchor = anchor_with_phone("+905551234567");
        assert_eq!(check_verification(&anchor, None), Err(VerificationPrompt::PhoneLast4));
    }

    #[test]
    fn check_verification_falls_back_to_name_without_phone() {
        let mut anchor = anchor_with_phone("+905551234567");
        anchor.phone = None;
        assert_eq!(check_verification(&anchor, None), Err(VerificationPrompt::FullName));
    }

    #[test]
    fn full_result_is_redacted() {
        let data = serde_json::json!({"phone": "+905551234567", "email": "a@b.com"});
        let full = get_full_result(&data);
        assert_eq!(full["phone"], "+90******4567");
    }
}
