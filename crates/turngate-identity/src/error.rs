use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("lookup backend error: {0}")]
    Lookup(String),

    #[error("sessions error: {0}")]
    Sessions(#[from] turngate_sessions::SessionsError),
}

pub type Result<T> = std::result::Result<T, IdentityError>;
