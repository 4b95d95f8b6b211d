use serde::{Deserialize, Serialize};

/// Closed-set tool outcome (§3, §7). Every tool result and every turn result
/// is tagged with exactly one of these — never a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Ok,
    NotFound,
    ValidationError,
    VerificationRequired,
    NeedMoreInfo,
    Denied,
    InfraError,
}

impl Outcome {
    /// Priority used when the turn carries more than one tool outcome and no
    /// terminal state event resolved it (§4.4: "highest-priority tool
    /// outcome"). Lower number wins.
    pub fn priority(&self) -> u8 {
        match self {
            Outcome::Denied => 0,
            Outcome::InfraError => 1,
            Outcome::VerificationRequired => 2,
            Outcome::ValidationError => 3,
            Outcome::NeedMoreInfo => 4,
            Outcome::NotFound => 5,
            Outcome::Ok => 6,
        }
    }

    /// Map a legacy/loosely-typed outcome string onto the closed enum.
    ///
    /// Returns `Ok` only for strings that are unambiguously safe; anything
    /// unrecognized fails closed to `InfraError` per §9's documented default.
    pub fn normalize(raw: &str) -> Outcome {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OK" | "SUCCESS" => Outcome::Ok,
            "NOT_FOUND" | "NOTFOUND" => Outcome::NotFound,
            "VALIDATION_ERROR" | "INVALID" => Outcome::ValidationError,
            "VERIFICATION_REQUIRED" | "NEEDS_VERIFICATION" => Outcome::VerificationRequired,
            "NEED_MORE_INFO" | "NEEDS_MORE_INFO" => Outcome::NeedMoreInfo,
            "DENIED" | "FORBIDDEN" => Outcome::Denied,
            "INFRA_ERROR" | "ERROR" | "FAILED" => Outcome::InfraError,
            _ => Outcome::InfraError,
        }
    }

    pub fn pick_highest_priority(outcomes: impl IntoIterator<Item = Outcome>) -> Option<Outcome> {
        outcomes.into_iter().min_by_key(|o| o.priority())
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Ok => "OK",
            Outcome::NotFound => "NOT_FOUND",
            Outcome::ValidationError => "VALIDATION_ERROR",
            Outcome::VerificationRequired => "VERIFICATION_REQUIRED",
            Outcome::NeedMoreInfo => "NEED_MORE_INFO",
            Outcome::Denied => "DENIED",
            Outcome::InfraError => "INFRA_ERROR",
        };
        f.write_str(s)
    }
}

/// Stable event tags a tool may emit alongside its outcome (§4.4); the
/// orchestrator consumes these to drive the verification FSM and the
/// enumeration counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateEvent {
    VerificationPassed,
    VerificationFailed,
}

/// Marker a tool attaches to a `VERIFICATION_REQUIRED` result so the
/// Autoverify Gate (§4.6) knows the result is eligible for channel-proof
/// skipping. Carries only the query type, never raw identity data — the
/// anchor on turn state is the source of truth for what is being verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityContext {
    pub query_type: String,
}

/// Wire contract between any tool and the pipeline (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub outcome: Outcome,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub message: String,
    #[serde(default)]
    pub state_events: Vec<StateEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_context: Option<IdentityContext>,
}

impl ToolResult {
    /// §3: `message` is REQUIRED — forced if missing. Use this constructor
    /// from tool handlers instead of building the struct literal directly so
    /// the invariant can never be silently skipped.
    pub fn new(name: impl Into<String>, outcome: Outcome, message: impl Into<String>) -> Self {
        let message = {
            let m = message.into();
            if m.trim().is_empty() {
                default_message_for(outcome).to_string()
            } else {
                m
            }
        };
        Self {
            name: name.into(),
            outcome,
            success: matches!(outcome, Outcome::Ok),
            data: None,
            message,
            state_events: Vec::new(),
            identity_context: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_state_event(mut self, event: StateEvent) -> Self {
        self.state_events.push(event);
        self
    }

    pub fn with_identity_context(mut self, query_type: impl Into<String>) -> Self {
        self.identity_context = Some(IdentityContext {
            query_type: query_type.into(),
        });
        self
    }
}

fn default_message_for(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Ok => "ok",
        Outcome::NotFound => "record not found",
        Outcome::ValidationError => "invalid input",
        Outcome::VerificationRequired => "verification required",
        Outcome::NeedMoreInfo => "more information needed",
        Outcome::Denied => "request denied",
        Outcome::InfraError => "internal error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_fail_closed() {
        assert_eq!(Outcome::normalize("banana"), Outcome::InfraError);
        assert_eq!(Outcome::normalize("ok"), Outcome::Ok);
        assert_eq!(Outcome::normalize("Not_Found"), Outcome::NotFound);
    }

    #[test]
    fn highest_priority_prefers_denied_over_ok() {
        let picked = Outcome::pick_highest_priority([Outcome::Ok, Outcome::Denied, Outcome::NotFound]);
        assert_eq!(picked, Some(Outcome::Denied));
    }

    #[test]
    fn message_forced_when_blank() {
        let r = ToolResult::new("order_status", Outcome::NotFound, "   ");
        assert_eq!(r.message, "record not found");
    }
}
