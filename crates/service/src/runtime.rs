//! Runtime wiring
//!
//! Builds the transport, session and clients from an [`AppConfig`] so binaries
//! only deal with one value. Also re-exposes `common::env` helpers so binary
//! crates do not depend on `common` directly.

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::auth::{FileSessionStore, SessionManager, SessionStore};
use crate::clients::{AdminClient, SearchClient};
use crate::pagination::ResultsPaginator;
use crate::search::SearchQueryValidator;
use crate::transport::http::HttpTransport;

/// Make sure the session file's directory exists.
pub async fn ensure_env(session_path: &str) -> anyhow::Result<()> {
    common::env::ensure_session_dir(session_path).await
}

/// Everything a front end needs to talk to the backend.
pub struct LocatorContext {
    pub session: Arc<SessionManager<HttpTransport>>,
    pub search: SearchClient<HttpTransport>,
    pub admin: AdminClient<HttpTransport>,
    pub validator: SearchQueryValidator,
    pub results: ResultsPaginator<SearchClient<HttpTransport>>,
    pub page_limit: u32,
}

impl LocatorContext {
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        ensure_env(&cfg.session.store_path).await?;
        let transport = Arc::new(HttpTransport::from_config(&cfg.api)?);
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&cfg.session.store_path));
        Ok(Self::with_parts(transport, store, cfg))
    }

    pub fn with_parts(transport: Arc<HttpTransport>, store: Arc<dyn SessionStore>, cfg: &AppConfig) -> Self {
        let session = Arc::new(SessionManager::new(transport, store));
        let search = SearchClient::new(session.clone());
        let results = ResultsPaginator::new(Arc::new(search.clone()));
        info!(base_url = %cfg.api.base_url, signed_in = session.is_authenticated(), "locator context ready");
        Self {
            admin: AdminClient::new(session.clone(), &cfg.search),
            validator: SearchQueryValidator::from_config(&cfg.search),
            page_limit: cfg.search.page_limit.max(1),
            session,
            search,
            results,
        }
    }
}
