//! Shared pattern detectors used across the filter chain. Kept narrow and
//! example-based rather than exhaustive, per §9's documented "simplified
//! leak filter variant" decision (see DESIGN.md).

use once_cell::sync::Lazy;
use regex::Regex;

/// Internal/technical vocabulary that should never reach the user: tool
/// names, framework jargon, raw JSON/HTML dumps, system-prompt disclosure
/// (§4.11 filter 1).
static INTERNAL_VOCAB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(system prompt|tool_use|tool_result|function_call|json schema|stack trace|anthropic|claude|api[_ ]?key|temperature=|\bsql\b|select \* from)\b|```|<[a-z][a-z0-9]*[ >]|\{\s*\"",
    )
    .expect("valid regex")
});

/// Internal record identifiers that must never be exposed verbatim
/// (§4.11 filter 4a: NEVER_EXPOSE).
static NEVER_EXPOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b|\bconv_[a-z0-9-]+\b|\bsource_table\b|\banchor\.(id|customer_id)\b",
    )
    .expect("valid regex")
});

/// A phone-number-shaped run of digits, loosely matching common separators.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+?\d[\s.\-]?){9,15}").expect("valid regex"));

/// Self-description / internal-protocol disclosure phrases
/// (§4.11 filter 8).
static SELF_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(as an ai|i am a language model|i'?m a language model|i don'?t have access|i do not have access|system policy (forbids|prevents)|as a large language model|ben bir yapay zeka|bir dil modeliyim|sistem politikası)\b",
    )
    .expect("valid regex")
});

/// Hedging words that, if present, keep an event claim from counting as
/// unbacked confabulation (the speaker is qualifying the claim, not
/// asserting it happened).
static HEDGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(may|might|should|usually|typically|genellikle|muhtemelen|olabilir)\b")
        .expect("valid regex")
});

/// Concrete event claims that must be backed by a successful tool call
/// (§4.11 filter 9): delivery, handoff, refund, specific dates/times.
static EVENT_CLAIM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(delivered|was left with|left with the neighbor|refund (has been |was )?processed|teslim edildi|komşuya bırakıldı|iade (işlendi|gerçekleşti)|kargoya verildi)\b",
    )
    .expect("valid regex")
});

/// Phrases claiming the assistant itself completed an action
/// (§4.11 filter 10).
static ACTION_CLAIM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(i('| )?ve processed|i processed your|i have submitted|i('| )?ve submitted|işleminizi (gerçekleştirdim|tamamladım)|talebinizi oluşturdum)\b",
    )
    .expect("valid regex")
});

/// Policy-guidance topic keywords (§4.11 filter 11): refund / return / cancel.
static POLICY_TOPIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(refund|return|cancel|iade|iptal)\b").expect("valid regex")
});

/// Markers that a response already contains actionable policy guidance
/// (a timeframe or a next step), so filter 11 does not need to append one.
static POLICY_GUIDANCE_PRESENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(business day|iş günü|gün içinde|within \d+ days?|takip edebilirsiniz|follow up)\b")
        .expect("valid regex")
});

pub fn has_internal_vocab(text: &str) -> bool {
    INTERNAL_VOCAB_RE.is_match(text)
}

pub fn has_never_expose_identifier(text: &str) -> bool {
    NEVER_EXPOSE_RE.is_match(text)
}

pub fn find_phone(text: &str) -> Option<&str> {
    PHONE_RE.find(text).map(|m| m.as_str())
}

pub fn has_self_description(text: &str) -> bool {
    SELF_DESCRIPTION_RE.is_match(text)
}

pub fn has_unbacked_event_claim(text: &str) -> bool {
    EVENT_CLAIM_RE.is_match(text) && !HEDGE_RE.is_match(text)
}

pub fn find_action_claim(text: &str) -> Option<&str> {
    ACTION_CLAIM_RE.find(text).map(|m| m.as_str())
}

pub fn is_policy_topic(text: &str) -> bool {
    POLICY_TOPIC_RE.is_match(text)
}

pub fn has_policy_guidance(text: &str) -> bool {
    POLICY_GUIDANCE_PRESENT_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_sentence_has_no_internal_vocab() {
        assert!(!has_internal_vocab("Telyx telefon kanalı ile iletişim sağlar."));
    }

    #[test]
    fn json_dump_is_detected() {
        assert!(has_internal_vocab(r#"{"name": "order_status"}"#));
    }

    #[test]
    fn event_claim_without_hedge_is_unbacked() {
        assert!(has_unbacked_event_claim("Your package was delivered this morning."));
    }

    #[test]
    fn hedged_event_claim_is_not_flagged() {
        assert!(!has_unbacked_event_claim("Your package should be delivered today."));
    }

    #[test]
    fn finds_phone_like_sequence() {
        assert!(find_phone("call us at +1 424 527 5089 anytime").is_some());
    }
}
