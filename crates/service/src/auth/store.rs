use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use models::session::Session;
use tracing::warn;

use super::errors::AuthError;

/// Where the session lives between process restarts.
///
/// Calls are synchronous so that logout can clear the session without awaiting.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session, AuthError>;
    fn save(&self, session: &Session) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn with_session(session: Session) -> Self {
        Self { inner: Mutex::new(session) }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session, AuthError> {
        let guard = self.inner.lock().map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().map_err(|e| AuthError::Store(e.to_string()))?;
        *guard = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().map_err(|e| AuthError::Store(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// JSON file holding the session.
///
/// A missing or unreadable file loads as an empty session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session, AuthError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
                Session::default()
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Session::default()),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AuthError::Store(e.to_string()))?;
            }
        }
        let data = serde_json::to_vec(session).map_err(|e| AuthError::Store(e.to_string()))?;
        std::fs::write(&self.path, data).map_err(|e| AuthError::Store(e.to_string()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }
}
