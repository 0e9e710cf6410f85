use thiserror::Error;

/// Malformed user input. Raised before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("location required")]
    LocationRequired,
    #[error("zip code must be 5 digits")]
    ShortZipCode,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid email")]
    InvalidEmail,
}
