use thiserror::Error;

/// Authentication outcomes that callers must act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session expired")]
    SessionExpired,
    #[error("session store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 1004,
            AuthError::SessionExpired => 1005,
            AuthError::Store(_) => 1200,
        }
    }
}
