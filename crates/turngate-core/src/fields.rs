use std::collections::HashMap;

/// Canonical field name plus the input aliases it accepts (§6).
///
/// Order matters only for readability; lookups are by name.
const CANONICAL_FIELDS: &[(&str, &[&str])] = &[
    ("order_number", &["order_id", "orderId", "siparis_no"]),
    ("phone", &["phone_number", "telefon"]),
    ("customer_name", &["name", "full_name", "ad_soyad"]),
    ("vkn", &[]),
    ("tc", &["tckn"]),
    ("ticket_number", &["ticket_id"]),
    ("invoice_number", &["invoice_id", "fatura_no"]),
    ("tracking_number", &["tracking_id", "kargo_takip_no"]),
    ("product_id", &["productId"]),
    ("product_name", &["productName"]),
    ("sku", &[]),
    ("return_number", &["return_id"]),
    ("email", &["email_address"]),
    ("query_type", &["queryType"]),
    ("verification_input", &["verificationInput", "verification_answer"]),
];

/// Resolve any accepted alias (case-sensitive on the canonical side, as the
/// aliases themselves are declared in their natural casing) to its canonical
/// field name. Returns the input unchanged if it is not a known alias —
/// unknown keys pass through so tool-specific extra fields are not dropped.
pub fn canonical_name(key: &str) -> &str {
    for (canonical, aliases) in CANONICAL_FIELDS {
        if *canonical == key || aliases.contains(&key) {
            return canonical;
        }
    }
    key
}

/// Canonicalize every key of a field map. Idempotent: canonicalizing twice
/// equals canonicalizing once (§8), since the output only ever contains
/// canonical names, which map to themselves.
pub fn canonicalize_fields(input: &HashMap<String, String>) -> HashMap<String, String> {
    let mut out = HashMap::with_capacity(input.len());
    for (k, v) in input {
        out.insert(canonical_name(k).to_string(), v.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_maps_to_canonical() {
        assert_eq!(canonical_name("order_id"), "order_number");
        assert_eq!(canonical_name("siparis_no"), "order_number");
        assert_eq!(canonical_name("order_number"), "order_number");
    }

    #[test]
    fn unknown_key_passes_through() {
        assert_eq!(canonical_name("totally_unrelated"), "totally_unrelated");
    }

    #[test]
    fn canonicalizing_twice_is_idempotent() {
        let mut m = HashMap::new();
        m.insert("order_id".to_string(), "ORD-1".to_string());
        m.insert("telefon".to_string(), "555".to_string());

        let once = canonicalize_fields(&m);
        let twice = canonicalize_fields(&once);
        assert_eq!(once, twice);
        assert_eq!(once.get("order_number").map(String::as_str), Some("ORD-1"));
        assert_eq!(once.get("phone").map(String::as_str), Some("555"));
    }
}
