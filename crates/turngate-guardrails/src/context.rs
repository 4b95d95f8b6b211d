use turngate_core::{ToolResult, TurnState};

/// Everything a filter needs to judge one draft response (§4.11). Built
/// fresh by the orchestrator for each pass through the chain — after a
/// correction, the orchestrator rebuilds it with the corrected `response`.
pub struct GuardrailContext<'a> {
    pub response: &'a str,
    pub language: &'a str,
    pub state: &'a TurnState,
    pub tool_results: &'a [ToolResult],
    /// Detected intent tag from the Classifier + Router (§4.9), if any.
    pub intent: Option<&'a str>,
    /// Intents in the business's configured tool-required set (§4.11 filter 5).
    pub tool_required_intents: &'a [String],
    pub had_tool_success: bool,
}

impl<'a> GuardrailContext<'a> {
    pub fn had_successful_tool_named(&self, name: &str) -> bool {
        self.tool_results
            .iter()
            .any(|r| r.name == name && r.success)
    }
}
