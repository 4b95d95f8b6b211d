use serde::{Deserialize, Serialize};

use crate::lock::LockReason;

/// Verdict actions a guardrail filter may return (§3, §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardrailAction {
    Pass,
    Sanitize,
    Block,
    NeedMinInfoForTool,
}

/// A re-prompt request naming the correction type and the constraint the
/// LLM must satisfy (§4.11 filters 7–9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsCorrection {
    pub r#type: CorrectionType,
    pub constraint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, std::hash::Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectionType {
    ToolOnlyDataLeak,
    InternalProtocolLeak,
    Confabulation,
}

/// Final verdict produced by one filter in the guardrail chain.
///
/// Invariant (§3): when `action=Sanitize`, `final_response` carries the
/// sanitized text; when `action=Block`, it carries the canned safe message;
/// `NeedMinInfoForTool` carries the field list via `missing_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub action: GuardrailAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_correction: Option<NeedsCorrection>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    /// Name of the filter that produced this verdict, for telemetry (§4.14).
    pub filter: &'static str,
    /// Set by the PII Prevention Scan (§4.11 filter 2) on a CRITICAL match;
    /// the orchestrator applies the lock via `turngate-sessions::SessionLock`
    /// rather than the filter reaching into persistence itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockReason>,
}

impl GuardrailVerdict {
    pub fn pass(filter: &'static str) -> Self {
        Self {
            action: GuardrailAction::Pass,
            final_response: None,
            needs_correction: None,
            missing_fields: Vec::new(),
            filter,
            lock: None,
        }
    }

    pub fn sanitize(filter: &'static str, text: impl Into<String>) -> Self {
        Self {
            action: GuardrailAction::Sanitize,
            final_response: Some(text.into()),
            needs_correction: None,
            missing_fields: Vec::new(),
            filter,
            lock: None,
        }
    }

    pub fn block(filter: &'static str, safe_text: impl Into<String>) -> Self {
        Self {
            action: GuardrailAction::Block,
            final_response: Some(safe_text.into()),
            needs_correction: None,
            missing_fields: Vec::new(),
            filter,
            lock: None,
        }
    }

    /// Same as [`Self::block`] but additionally tells the orchestrator which
    /// [`LockReason`] to apply (§4.11 filter 2: PII Prevention Scan CRITICAL).
    pub fn block_with_lock(filter: &'static str, safe_text: impl Into<String>, reason: LockReason) -> Self {
        Self {
            action: GuardrailAction::Block,
            final_response: Some(safe_text.into()),
            needs_correction: None,
            missing_fields: Vec::new(),
            filter,
            lock: Some(reason),
        }
    }

    pub fn need_min_info(filter: &'static str, fields: Vec<String>) -> Self {
        Self {
            action: GuardrailAction::NeedMinInfoForTool,
            final_response: None,
            needs_correction: None,
            missing_fields: fields,
            filter,
            lock: None,
        }
    }

    pub fn need_correction(
        filter: &'static str,
        r#type: CorrectionType,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            action: GuardrailAction::NeedMinInfoForTool,
            final_response: None,
            needs_correction: Some(NeedsCorrection {
                r#type,
                constraint: constraint.into(),
            }),
            missing_fields: Vec::new(),
            filter,
            lock: None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.action, GuardrailAction::Pass)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.action,
            GuardrailAction::Sanitize | GuardrailAction::Block
        )
    }
}
