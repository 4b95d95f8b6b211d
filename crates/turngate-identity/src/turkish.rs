//! Turkish-aware name comparison (§4.7 `verifyAgainstAnchor` step 2).

use unicode_normalization::UnicodeNormalization;

/// Turkish-specific casefolding: dotted/dotless I (both cases) and the five
/// diacritic letters all fold to the same plain-ASCII form the comparison
/// works in (İ, I, and ı all become plain `i`), then the rest is lowercased.
/// This is what makes a name typed on an ASCII-only keyboard (`I`/`i`)
/// compare equal to the same name typed with proper Turkish letters
/// (`İ`/`ı`) — per spec: İ→i, I→ı, ı→i, chained to a single fixed point.
fn turkish_fold(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| match c {
            'İ' | 'I' | 'ı' => 'i',
            'ğ' | 'Ğ' => 'g',
            'ü' | 'Ü' => 'u',
            'ş' | 'Ş' => 's',
            'ö' | 'Ö' => 'o',
            'ç' | 'Ç' => 'c',
            other => other,
        })
        .collect();
    replaced.nfc().collect::<String>().to_lowercase()
}

fn tokenize(s: &str) -> Vec<String> {
    turkish_fold(s)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Compare a provided name against a stored anchor name.
///
/// Requires at least 2 matched tokens if the stored name has >= 2 tokens,
/// else at least 1. Each provided token must be contained-in-or-contain some
/// stored token after Turkish folding — this tolerates partial surnames and
/// minor transliteration differences without accepting a bare first name
/// against a full "first last" stored name.
pub fn compare_turkish_names(provided: &str, stored: &str) -> bool {
    let provided_tokens = tokenize(provided);
    let stored_tokens = tokenize(stored);

    if provided_tokens.is_empty() || stored_tokens.is_empty() {
        return false;
    }

    let required = if stored_tokens.len() >= 2 { 2 } else { 1 };
    if provided_tokens.len() < required {
        return false;
    }

    let matched = provided_tokens
        .iter()
        .filter(|pt| {
            stored_tokens
                .iter()
                .any(|st| st.contains(pt.as_str()) || pt.contains(st.as_str()))
        })
        .count();

    matched >= required
}
