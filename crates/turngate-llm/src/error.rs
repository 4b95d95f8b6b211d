use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("tool loop exceeded its iteration bound")]
    IterationBoundExceeded,
}

pub type Result<T> = std::result::Result<T, LlmError>;
