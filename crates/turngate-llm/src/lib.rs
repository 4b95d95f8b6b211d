pub mod anchor_change;
pub mod anthropic;
pub mod builder;
pub mod error;
pub mod provider;
pub mod toolloop;

pub use anchor_change::detect_anchor_change;
pub use anthropic::AnthropicProvider;
pub use builder::RequestBuilder;
pub use error::{LlmError, Result};
pub use provider::{ChatRequest, ChatResponse, LlmProvider, Message, Role, ToolCall, ToolDefinition};
pub use toolloop::{run_tool_loop, LoopResult};
