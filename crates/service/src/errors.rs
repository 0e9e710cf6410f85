use thiserror::Error;

pub use models::errors::ValidationError;

use crate::auth::errors::AuthError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ServiceError {
    /// The caller must send the user back to the login surface.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ServiceError::Auth(AuthError::SessionExpired))
    }

    /// Message suitable for showing next to the form that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(e) => e.to_string(),
            ServiceError::Auth(AuthError::InvalidCredentials) => "Incorrect email or password.".to_string(),
            ServiceError::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            ServiceError::Transport(e) => e.user_message().to_string(),
        }
    }
}
