use std::sync::Arc;

use async_trait::async_trait;
use models::search::{SearchQuery, SearchRequest, SearchResponse};
use tracing::{debug, instrument};

use crate::auth::SessionManager;
use crate::errors::ServiceError;
use crate::pagination::SearchBackend;
use crate::transport::{ApiRequest, Transport, TransportError};

pub const SEARCH_PATH: &str = "/stores/search";

/// `POST /stores/search`.
pub struct SearchClient<T: Transport> {
    session: Arc<SessionManager<T>>,
}

impl<T: Transport> Clone for SearchClient<T> {
    fn clone(&self) -> Self {
        Self { session: self.session.clone() }
    }
}

impl<T: Transport> SearchClient<T> {
    pub fn new(session: Arc<SessionManager<T>>) -> Self {
        Self { session }
    }

    #[instrument(skip(self, body), fields(page = body.page, limit = body.limit))]
    pub async fn search_request(&self, body: &SearchRequest) -> Result<SearchResponse, ServiceError> {
        let request = ApiRequest::post_json(SEARCH_PATH, body)?;
        let response = self.session.execute(request).await?.error_for_status()?;
        let decoded: SearchResponse = response.decode()?;
        // internal failures come back as 200 with `error` set
        if let Some(message) = decoded.error {
            debug!(error = %message, "backend reported search failure");
            return Err(TransportError::Backend(message).into());
        }
        Ok(decoded)
    }
}

#[async_trait]
impl<T: Transport> SearchBackend for SearchClient<T> {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError> {
        self.search_request(&query.to_request()).await
    }
}
