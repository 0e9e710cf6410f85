use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use models::errors::ValidationError;
use models::session::Session;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::domain::{Attempt, LoginInput, RefreshRequest, RefreshedToken, TokenPair};
use super::errors::AuthError;
use super::store::SessionStore;
use crate::errors::ServiceError;
use crate::transport::{ApiRequest, ApiResponse, StatusCode, Transport, TransportError};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";

struct SessionState {
    session: Session,
    /// Bumped on every login, renewal and clear.
    epoch: u64,
}

/// Owns the session and wraps every authenticated exchange.
///
/// Outbound requests get the current bearer credential. A 401 triggers at most
/// one renewal per request. Concurrent 401s share a single renewal: callers
/// queue on `renewal`, and whoever finds the epoch already moved past the one
/// its credential came from reuses the outcome instead of renewing again.
pub struct SessionManager<T: Transport> {
    transport: Arc<T>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    renewal: Mutex<()>,
}

impl<T: Transport> SessionManager<T> {
    /// Build a manager, restoring whatever session the store holds.
    pub fn new(transport: Arc<T>, store: Arc<dyn SessionStore>) -> Self {
        let session = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not restore session; starting signed out");
            Session::default()
        });
        debug!(restored = !session.is_empty(), "session manager initialized");
        Self { transport, store, state: RwLock::new(SessionState { session, epoch: 0 }), renewal: Mutex::new(()) }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> Session {
        self.read().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().session.access_token.is_some()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Sign in and store the issued token pair.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<(), ServiceError> {
        if input.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        if input.password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let request = ApiRequest::post_json(LOGIN_PATH, &input)?;
        let response = self.transport.send(&request).await?;
        if matches!(
            response.status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            debug!(status = response.status.as_u16(), "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        let tokens: TokenPair = response.error_for_status()?.decode()?;

        let session = Session::new(tokens.access_token, tokens.refresh_token);
        let epoch = {
            let mut state = self.write();
            state.session = session.clone();
            state.epoch += 1;
            state.epoch
        };
        self.persist(&session);
        info!(event = "login_succeeded", epoch, "session established");
        Ok(())
    }

    /// Drop the session, in memory and in the store. Safe to call repeatedly.
    pub fn logout(&self) {
        self.clear_session("logout");
    }

    /// Copy of `request` carrying the current credential, plus its first attempt.
    pub fn attach(&self, request: &ApiRequest) -> (ApiRequest, Attempt) {
        let state = self.read();
        let attempt = Attempt::first(state.epoch);
        match state.session.access_token.as_deref() {
            Some(token) => (request.with_bearer(token), attempt),
            None => (request.clone(), attempt),
        }
    }

    /// attach → send → renew on 401 → replay once.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ServiceError> {
        let (outbound, attempt) = self.attach(&request);
        let response = self.transport.send(&outbound).await?;
        self.handle_response(&request, attempt, response).await
    }

    /// Resolve a response received for `request` under `attempt`.
    ///
    /// Non-401 responses pass through untouched. A 401 on a first attempt
    /// renews the session and replays the original request exactly once; a
    /// 401 on an attempt that was already replayed is `SessionExpired`.
    pub async fn handle_response(
        &self,
        request: &ApiRequest,
        attempt: Attempt,
        response: ApiResponse,
    ) -> Result<ApiResponse, ServiceError> {
        if !response.is_unauthorized() {
            return Ok(response);
        }
        if attempt.retried {
            warn!(request_id = %request.id, path = %request.path, "401 after renewal; giving up");
            return Err(AuthError::SessionExpired.into());
        }

        let token = self.renew(attempt.epoch).await?;
        debug!(request_id = %request.id, path = %request.path, "replaying with renewed credential");
        let response = self.transport.send(&request.with_bearer(token)).await?;
        self.settle_replay(request, attempt.retry(), response)
    }

    fn settle_replay(&self, request: &ApiRequest, attempt: Attempt, response: ApiResponse) -> Result<ApiResponse, ServiceError> {
        debug_assert!(attempt.retried);
        if response.is_unauthorized() {
            warn!(request_id = %request.id, path = %request.path, "401 after renewal; giving up");
            return Err(AuthError::SessionExpired.into());
        }
        Ok(response)
    }

    /// Single-flight renewal. Returns the access token to replay with.
    #[instrument(skip(self))]
    async fn renew(&self, seen_epoch: u64) -> Result<String, AuthError> {
        let _gate = self.renewal.lock().await;

        let refresh_token = {
            let state = self.read();
            if state.epoch != seen_epoch {
                debug!(current_epoch = state.epoch, "session changed while waiting; reusing outcome");
                return state.session.access_token.clone().ok_or(AuthError::SessionExpired);
            }
            state.session.refresh_token.clone()
        };
        let Some(refresh_token) = refresh_token else {
            debug!("no refresh token; session cannot be renewed");
            return Err(AuthError::SessionExpired);
        };

        match self.request_refresh(&refresh_token).await {
            Ok(refreshed) => {
                let (session, epoch) = {
                    let mut state = self.write();
                    state.session.access_token = Some(refreshed.access_token.clone());
                    if let Some(rotated) = refreshed.refresh_token {
                        state.session.refresh_token = Some(rotated);
                    }
                    state.epoch += 1;
                    (state.session.clone(), state.epoch)
                };
                self.persist(&session);
                info!(event = "session_renewed", epoch, "access token renewed");
                Ok(refreshed.access_token)
            }
            Err(e) => {
                warn!(error = %e, "session renewal failed");
                self.clear_session("renewal_failed");
                Err(AuthError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshedToken, TransportError> {
        let request = ApiRequest::post_json(REFRESH_PATH, &RefreshRequest { refresh_token })?;
        let response = self.transport.send(&request).await?.error_for_status()?;
        response.decode()
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session) {
            warn!(error = %e, code = e.code(), "session could not be persisted");
        }
    }

    fn clear_session(&self, reason: &'static str) {
        let epoch = {
            let mut state = self.write();
            state.session.clear();
            state.epoch += 1;
            state.epoch
        };
        if let Err(e) = self.store.clear() {
            warn!(error = %e, code = e.code(), "persisted session could not be cleared");
        }
        info!(event = "session_cleared", reason, epoch, "session cleared");
    }
}
