//! Message catalog (§6: "messages shown to the user are selected from a
//! message catalog by key + language + directive + severity"). Every
//! deterministic, user-visible string a filter produces comes from here —
//! never composed from a raw exception or tool message.

fn is_tr(language: &str) -> bool {
    language.eq_ignore_ascii_case("tr")
}

pub fn firewall_soft_refusal(language: &str) -> &'static str {
    if is_tr(language) {
        "Bu konuda size yardımcı olamıyorum, ancak talebinizle ilgili başka bir şekilde destek olabilirim."
    } else {
        "I'm not able to help with that, but I'd be glad to help with your request another way."
    }
}

pub fn firewall_canned_fallback(language: &str) -> &'static str {
    if is_tr(language) {
        "Üzgünüm, bu talebi şu an yanıtlayamıyorum. Size başka nasıl yardımcı olabilirim?"
    } else {
        "Sorry, I'm unable to answer that right now. How else can I help?"
    }
}

/// Kept word-for-word identical to `turngate_sessions::lock::lock_message`'s
/// `PII_RISK` case — this crate sits below `turngate-sessions` in the
/// dependency order so cannot call it directly, but the user-visible text
/// must match since both are triggered by the same lock reason.
pub fn pii_risk_lock(language: &str) -> &'static str {
    if is_tr(language) {
        "Güvenlik nedeniyle bu görüşme geçici olarak kısıtlandı. Lütfen daha sonra tekrar deneyin veya müşteri temsilcimizle iletişime geçin."
    } else {
        "This conversation has been temporarily restricted for security reasons. Please try again later or contact a representative."
    }
}

pub fn not_found_override(language: &str) -> &'static str {
    if is_tr(language) {
        "Belirttiğiniz kayıt bulunamadı. Lütfen numarayı veya bilgiyi tekrar paylaşır mısınız?"
    } else {
        "We couldn't find a record matching what you provided. Could you double-check and re-share the number?"
    }
}

pub fn internal_leak_block(language: &str) -> &'static str {
    if is_tr(language) {
        "Bu bilgiyi paylaşamıyorum. Size başka nasıl yardımcı olabilirim?"
    } else {
        "I'm not able to share that information. How else can I help you?"
    }
}

pub fn identity_mismatch_block(language: &str) -> &'static str {
    if is_tr(language) {
        "Paylaştığınız bilgiler bu kayıtla eşleşmiyor, bu nedenle detayları paylaşamıyorum. Lütfen müşteri hizmetlerimizle iletişime geçin."
    } else {
        "The details you provided don't match this record, so I can't share that information. Please contact customer support."
    }
}

pub fn missing_identifier(language: &str, field_hint: &str) -> String {
    if is_tr(language) {
        format!("Size yardımcı olabilmem için {field_hint} bilgisini paylaşır mısınız?")
    } else {
        format!("Could you share your {field_hint} so I can look into this?")
    }
}

pub fn fatal_error_template(language: &str) -> &'static str {
    if is_tr(language) {
        "Şu anda bu isteği işleyemiyoruz. Lütfen birazdan tekrar deneyin."
    } else {
        "We're unable to process this request right now. Please try again shortly."
    }
}

pub fn action_offer_rewrite(language: &str, topic: &str) -> String {
    if is_tr(language) {
        format!("{topic} talebinizi sizin için oluşturabilirim, onaylarsanız hemen ilerletiyorum.")
    } else {
        format!("I can put in a {topic} request for you — just confirm and I'll get that started.")
    }
}

pub fn policy_guidance_suffix(language: &str) -> &'static str {
    if is_tr(language) {
        " Talebinizi işleme almamız genellikle birkaç iş günü sürer; ilerlemeyi bu sohbetten takip edebilirsiniz."
    } else {
        " This typically takes a few business days to process, and you can follow up here for status."
    }
}
