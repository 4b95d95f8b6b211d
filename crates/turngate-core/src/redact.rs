//! PII redaction — pure functions over structured records (§4.7, §9).
//!
//! Never mutate in place; callers always receive a new, redacted value.
//! Redaction happens before data reaches any user-facing layer — the
//! Verification Service's `get_full_result` and the Security Gateway's
//! phone-leak masking both route through here.

use crate::anchor::Anchor;

/// Mask a phone number to at most its last four digits, keeping a leading
/// `+` and country-code-length prefix visible (e.g. `+90******1234`).
/// §8 invariant: phone fields are masked regardless of verification state.
pub fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "*".repeat(digits.len().max(1));
    }
    let last4 = &digits[digits.len() - 4..];
    let cc_len = if digits.starts_with("90") {
        2
    } else if digits.starts_with('1') {
        1
    } else {
        digits.len().min(2)
    };
    let cc = &digits[..cc_len];
    format!("+{cc}******{last4}")
}

/// Mask an email address: first character of the local part, then `***`,
/// then `@domain` unchanged (e.g. `a***@domain.com`).
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

/// TC kimlik no / VKN are fully hidden — never partially shown.
pub fn mask_national_id(_value: &str) -> &'static str {
    "***HIDDEN***"
}

/// Redact an anchor's PII-bearing fields for release to the LLM / user,
/// even after successful verification (§4.7 `getFullResult`).
pub fn redact_anchor(anchor: &Anchor) -> Anchor {
    Anchor {
        id: anchor.id.clone(),
        customer_id: anchor.customer_id.clone(),
        name: anchor.name.clone(),
        phone: anchor.phone.as_deref().map(mask_phone),
        email: anchor.email.as_deref().map(mask_email),
        value: anchor.value.clone(),
        anchor_type: anchor.anchor_type.clone(),
        source_table: anchor.source_table.clone(),
    }
}

/// Redact PII-bearing keys inside an arbitrary JSON value returned by a
/// tool, applied before the payload is attached to the LLM-visible result.
pub fn redact_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key_lower = k.to_ascii_lowercase();
                let redacted = if key_lower.contains("phone") {
                    v.as_str().map(|s| serde_json::Value::String(mask_phone(s))).unwrap_or_else(|| v.clone())
                } else if key_lower.contains("email") {
                    v.as_str().map(|s| serde_json::Value::String(mask_email(s))).unwrap_or_else(|| v.clone())
                } else if key_lower == "tc" || key_lower == "vkn" || key_lower.contains("tckn") {
                    serde_json::Value::String(mask_national_id("").to_string())
                } else {
                    redact_json(v)
                };
                out.insert(k.clone(), redacted);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_json).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_is_masked_to_last_four() {
        assert_eq!(mask_phone("+14245275089"), "+1******5089");
    }

    #[test]
    fn email_is_masked_to_first_char() {
        assert_eq!(mask_email("ahmet@example.com"), "a***@example.com");
    }

    #[test]
    fn anchor_redaction_leaves_value_and_id_untouched() {
        let anchor = Anchor {
            id: "a1".into(),
            customer_id: Some("c1".into()),
            name: Some("Ahmet Yilmaz".into()),
            phone: Some("+905551234567".into()),
            email: Some("ahmet@example.com".into()),
            value: "ORD-2024-001".into(),
            anchor_type: "order".into(),
            source_table: "orders".into(),
        };
        let r = redact_anchor(&anchor);
        assert_eq!(r.value, "ORD-2024-001");
        assert_eq!(r.phone.unwrap(), "+90******4567");
        assert_eq!(r.email.unwrap(), "a***@example.com");
    }
}
