use serde::{Deserialize, Serialize};

/// Closed set of session-lock reasons (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockReason {
    PiiRisk,
    Enumeration,
    Abuse,
    ContentSafety,
}

impl LockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::PiiRisk => "PII_RISK",
            LockReason::Enumeration => "ENUMERATION",
            LockReason::Abuse => "ABUSE",
            LockReason::ContentSafety => "CONTENT_SAFETY",
        }
    }
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
