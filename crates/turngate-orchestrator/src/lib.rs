pub mod classifier;
pub mod error;
pub mod grounding;
pub mod identity_flow;
pub mod metrics;
pub mod orchestrator;
pub mod outcome_contract;
pub mod preflight;
pub mod router;

pub use error::{OrchestratorError, Result};
pub use orchestrator::{Orchestrator, ToolOutcomeEntry, TurnMetadata, TurnRequest, TurnResponse};

/// Per-turn knobs the gateway resolves once (business config + channel)
/// before calling `Orchestrator::handle_incoming_message` (§4.12, §10).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub model: String,
    pub max_tokens: u32,
    pub max_tool_iterations: u32,
    pub language: String,
    pub enumeration_threshold: u32,
    pub pii_lock_ttl_secs: i64,
    pub enumeration_lock_ttl_secs: i64,
    pub channel_proof_autoverify: bool,
}
