use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolsError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("sessions error: {0}")]
    Sessions(#[from] turngate_sessions::SessionsError),

    #[error("ssrf policy violation: {0}")]
    Ssrf(String),
}

pub type Result<T> = std::result::Result<T, ToolsError>;
