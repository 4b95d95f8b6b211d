//! Phone number normalization and cross-format variant generation (§4.5, §4.7).

/// Strip everything but digits and a leading `+`.
fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize any accepted phone format to E.164. Idempotent (§8): feeding an
/// already-normalized number back in yields the same string.
pub fn to_e164(raw: &str) -> String {
    let digits = digits_only(raw);
    if raw.trim_start().starts_with('+') {
        return format!("+{}", digits.trim_start_matches('0'));
    }
    // Turkish local format: 0 5xx xxx xx xx (11 digits, leading 0).
    if digits.len() == 11 && digits.starts_with('0') {
        return format!("+90{}", &digits[1..]);
    }
    // Bare Turkish mobile, no leading zero: 5xx xxx xx xx (10 digits).
    if digits.len() == 10 && digits.starts_with('5') {
        return format!("+90{digits}");
    }
    // US 10-digit local number.
    if digits.len() == 10 {
        return format!("+1{digits}");
    }
    // Already has a country code digit string (11+ digits), assume E.164 sans '+'.
    if digits.len() >= 11 {
        return format!("+{digits}");
    }
    format!("+{digits}")
}

/// Generate the cross-format variants a channel-possession lookup should try
/// against customer/order tables: E.164, bare national number, US-local,
/// TR-local-with-leading-zero (§4.5).
pub fn variants(raw: &str) -> Vec<String> {
    let e164 = to_e164(raw);
    let digits = digits_only(&e164);
    let mut out = vec![e164.clone()];

    if let Some(national) = digits.strip_prefix("90") {
        out.push(national.to_string());
        out.push(format!("0{national}"));
    } else if let Some(national) = digits.strip_prefix('1') {
        if national.len() == 10 {
            out.push(national.to_string());
        }
    }
    out.push(digits.clone());

    out.sort();
    out.dedup();
    out
}

/// Last 4 digits of any phone string, for §4.7's `phone_last4` comparison.
pub fn last4(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() < 4 {
        return None;
    }
    Some(digits[digits.len() - 4..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e164_normalization_is_idempotent() {
        let once = to_e164("+14245275089");
        let twice = to_e164(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn tr_local_format_normalizes_to_e164() {
        assert_eq!(to_e164("05551234567"), "+905551234567");
    }

    #[test]
    fn bare_tr_mobile_normalizes_to_e164() {
        assert_eq!(to_e164("5551234567"), "+905551234567");
    }

    #[test]
    fn variants_include_bare_national_form() {
        let v = variants("+905551234567");
        assert!(v.iter().any(|s| s == "5551234567"));
        assert!(v.iter().any(|s| s == "05551234567"));
    }

    #[test]
    fn last4_extracts_trailing_digits() {
        assert_eq!(last4("+14245275089").as_deref(), Some("5089"));
        assert_eq!(last4("12").as_deref(), None);
    }
}
