use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("core error: {0}")]
    Core(#[from] turngate_core::CoreError),

    #[error("sessions error: {0}")]
    Sessions(#[from] turngate_sessions::SessionsError),

    #[error("identity error: {0}")]
    Identity(#[from] turngate_identity::IdentityError),

    #[error("llm error: {0}")]
    Llm(#[from] turngate_llm::LlmError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
