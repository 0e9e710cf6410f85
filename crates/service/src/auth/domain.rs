use serde::{Deserialize, Serialize};

/// Console sign-in form.
#[derive(Clone, Serialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput").field("email", &self.email).finish_non_exhaustive()
    }
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Body returned by `POST /auth/refresh`; the refresh token is only present when rotated.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Per-request retry bookkeeping, threaded through the call instead of
/// flagging the request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub retried: bool,
    /// Session epoch the outbound credential was read from.
    pub epoch: u64,
}

impl Attempt {
    pub fn first(epoch: u64) -> Self {
        Self { retried: false, epoch }
    }

    pub fn retry(self) -> Self {
        Self { retried: true, ..self }
    }
}
