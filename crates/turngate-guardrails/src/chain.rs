use std::collections::HashSet;

use turngate_core::{CorrectionType, GuardrailVerdict};

use crate::context::GuardrailContext;
use crate::filters;

/// Runs the 11 ordered filters once, stopping at the first verdict that
/// isn't `PASS` (§4.11: "stop at first non-PASS that is terminal"). Emits
/// one `GUARDRAIL_VERDICT` log per non-pass filter (§10.2).
pub fn run(ctx: &GuardrailContext) -> GuardrailVerdict {
    for filter in filters::ORDERED {
        let verdict = filter(ctx);
        if !verdict.is_pass() {
            tracing::info!(
                filter = verdict.filter,
                action = ?verdict.action,
                "GUARDRAIL_VERDICT"
            );
            return verdict;
        }
    }
    GuardrailVerdict::pass("chain")
}

/// Bounds the re-prompt loop to at most one correction attempt per
/// [`CorrectionType`] per turn (§4.11). The orchestrator owns the actual
/// re-prompt (it needs the LLM); this tracker only answers "have we already
/// tried to fix this kind of problem this turn?".
#[derive(Debug, Default)]
pub struct CorrectionTracker {
    attempted: HashSet<CorrectionType>,
}

impl CorrectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a given correction type is requested
    /// this turn (and records it), `false` on every subsequent request —
    /// the caller must fall back to a deterministic safe message instead of
    /// re-prompting again.
    pub fn try_attempt(&mut self, correction_type: CorrectionType) -> bool {
        self.attempted.insert(correction_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngate_core::{Outcome, ToolResult, TurnState};

    #[test]
    fn plain_response_passes_the_whole_chain() {
        let state = TurnState::default();
        let ctx = GuardrailContext {
            response: "Telyx telefon kanalı ile iletişim sağlar.",
            language: "tr",
            state: &state,
            tool_results: &[],
            intent: None,
            tool_required_intents: &[],
            had_tool_success: false,
        };
        assert!(run(&ctx).is_pass());
    }

    #[test]
    fn not_found_override_wins_before_leak_filter_runs() {
        let state = TurnState::default();
        let results = vec![ToolResult::new("order_status", Outcome::NotFound, "no row")];
        let ctx = GuardrailContext {
            response: "Your order ORD-2024-001 shipped and will arrive at +1 424 527 5089.",
            language: "en",
            state: &state,
            tool_results: &results,
            intent: None,
            tool_required_intents: &[],
            had_tool_success: false,
        };
        let verdict = run(&ctx);
        assert_eq!(verdict.filter, "not_found_early_override");
    }

    #[test]
    fn correction_tracker_allows_each_type_once() {
        let mut tracker = CorrectionTracker::new();
        assert!(tracker.try_attempt(CorrectionType::Confabulation));
        assert!(!tracker.try_attempt(CorrectionType::Confabulation));
        assert!(tracker.try_attempt(CorrectionType::ToolOnlyDataLeak));
    }
}
