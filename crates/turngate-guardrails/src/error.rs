use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardrailsError {
    #[error("invalid regex pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, GuardrailsError>;
