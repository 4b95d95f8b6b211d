use async_trait::async_trait;
use turngate_core::{BusinessId, Channel, SessionId, ToolResult, TurnState};

use crate::schema::FieldSpec;

/// Read-only context handed to a tool at execution time.
pub struct ToolContext<'a> {
    pub business: &'a BusinessId,
    pub channel: Channel,
    pub session_id: &'a SessionId,
    pub state: &'a TurnState,
    pub language: &'a str,
}

/// Every business tool handler is a value implementing this capability —
/// dynamic dispatch keyed by name, never reflected at runtime (§9).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declared input fields, used both for validation (§4.8) and to build
    /// the JSON Schema exposed to the LLM (§4.10).
    fn fields(&self) -> &'static [FieldSpec];

    /// Activeflow tags this tool may be gated behind; `None` means it is
    /// available regardless of active flow (§4.10 gating).
    fn allowed_flows(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Whether this tool is in the configured tool-required intent set
    /// (§4.11 filter 5) — the guardrail enforces that a matching intent
    /// cannot be answered without this tool having been called.
    fn is_tool_required_intent(&self) -> bool {
        false
    }

    fn input_schema(&self) -> serde_json::Value {
        crate::schema::to_json_schema(self.fields())
    }

    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext<'_>) -> ToolResult;
}
