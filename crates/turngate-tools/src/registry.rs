use std::collections::HashMap;
use std::sync::Arc;

use turngate_core::{TurnState, VerificationStatus};

use crate::tool::Tool;

/// Keyed collection of tools (§9 "dynamic tool dispatch").
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tools exposed to the LLM this turn: only those allowed by the current
    /// `activeFlow` and verification state (§4.10 gating). Tools requiring a
    /// verified identity are withheld until `state.verification.status ==
    /// Verified`; `allowed_flows` further narrows by active flow.
    pub fn gated_for(&self, state: &TurnState) -> Vec<Arc<dyn Tool>> {
        self.tools
            .values()
            .filter(|t| match t.allowed_flows() {
                Some(flows) => state
                    .active_flow
                    .as_deref()
                    .map(|f| flows.contains(&f))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|_| !matches!(state.verification.status, VerificationStatus::Pending))
            .cloned()
            .collect()
    }

    pub fn tool_required_names(&self) -> Vec<&'static str> {
        self.tools
            .values()
            .filter(|t| t.is_tool_required_intent())
            .map(|t| t.name())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::tool::ToolContext;
    use async_trait::async_trait;
    use turngate_core::{Outcome, ToolResult};

    struct StubTool {
        name: &'static str,
        flows: Option<&'static [&'static str]>,
    }

    const FIELDS: &[FieldSpec] = &[];

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }
        fn fields(&self) -> &'static [FieldSpec] {
            FIELDS
        }
        fn allowed_flows(&self) -> Option<&'static [&'static str]> {
            self.flows
        }
        async fn execute(&self, _args: serde_json::Value, _ctx: &ToolContext<'_>) -> ToolResult {
            ToolResult::new(self.name, Outcome::Ok, "ok")
        }
    }

    #[test]
    fn gating_restricts_by_active_flow() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(StubTool { name: "order_status", flows: Some(&["ORDER_STATUS"]) }));
        reg.register(Arc::new(StubTool { name: "general_info", flows: None }));

        let mut state = TurnState::default();
        state.active_flow = Some("COMPLAINT".to_string());
        let gated = reg.gated_for(&state);
        let names: Vec<_> = gated.iter().map(|t| t.name()).collect();
        assert!(names.contains(&"general_info"));
        assert!(!names.contains(&"order_status"));
    }

    #[test]
    fn pending_verification_withholds_all_tools() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(StubTool { name: "general_info", flows: None }));
        let mut state = TurnState::default();
        state.verification.status = VerificationStatus::Pending;
        assert!(reg.gated_for(&state).is_empty());
    }
}
