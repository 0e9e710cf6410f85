use std::sync::Arc;

use configs::SearchConfig;
use models::admin::{
    AdminRecord, AdminTab, ImportReport, ImportStats, NewStore, NewUser, StoreUpdate, UserAccount, UserUpdate,
};
use models::pagination::PaginationState;
use models::search::SearchRequest;
use models::store::StoreListing;
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use super::search::SearchClient;
use crate::auth::SessionManager;
use crate::errors::ServiceError;
use crate::transport::{ApiRequest, Transport};

const USERS_PATH: &str = "/admin/users";
const STORES_PATH: &str = "/admin/stores";
const IMPORT_PATH: &str = "/admin/stores/import";

/// `/admin/stores/{id}` with the id as a single encoded path segment.
fn store_path(store_id: &str) -> String {
    format!("{STORES_PATH}/{}", urlencoding::encode(store_id))
}

/// One admin table page. Users come back unpaged, so `pagination` is `None` for them.
#[derive(Clone, Debug, PartialEq)]
pub struct AdminListing {
    pub records: Vec<AdminRecord>,
    pub pagination: Option<PaginationState>,
}

/// User and store management for the admin console.
pub struct AdminClient<T: Transport> {
    session: Arc<SessionManager<T>>,
    search: SearchClient<T>,
    page_limit: u32,
    nationwide_radius_miles: f64,
}

impl<T: Transport> AdminClient<T> {
    pub fn new(session: Arc<SessionManager<T>>, cfg: &SearchConfig) -> Self {
        Self {
            search: SearchClient::new(session.clone()),
            session,
            page_limit: cfg.admin_page_limit.max(1),
            nationwide_radius_miles: cfg.nationwide_radius_miles,
        }
    }

    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ServiceError> {
        let response = self.session.execute(request).await?.error_for_status()?;
        Ok(response.decode()?)
    }

    async fn call_empty(&self, request: ApiRequest) -> Result<(), ServiceError> {
        self.session.execute(request).await?.error_for_status()?;
        Ok(())
    }

    /// Records for `tab`. `page` only applies to stores.
    pub async fn list(&self, tab: AdminTab, page: u32) -> Result<AdminListing, ServiceError> {
        match tab {
            AdminTab::Users => {
                let records = self.list_users().await?.into_iter().map(AdminRecord::User).collect();
                Ok(AdminListing { records, pagination: None })
            }
            AdminTab::Stores => {
                let (stores, pagination) = self.list_stores(page).await?;
                let records = stores.into_iter().map(AdminRecord::Store).collect();
                Ok(AdminListing { records, pagination: Some(pagination) })
            }
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserAccount>, ServiceError> {
        self.call(ApiRequest::get(USERS_PATH)).await
    }

    /// Every store, paged, via an unanchored nationwide search.
    pub async fn list_stores(&self, page: u32) -> Result<(Vec<StoreListing>, PaginationState), ServiceError> {
        let body = SearchRequest::browse(page, self.page_limit, self.nationwide_radius_miles);
        let response = self.search.search_request(&body).await?;
        let pagination = PaginationState::new(body.page, body.limit, response.total);
        Ok((response.results, pagination))
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: NewUser) -> Result<UserAccount, ServiceError> {
        user.validate()?;
        let created: UserAccount = self.call(ApiRequest::post_json(USERS_PATH, &user)?).await?;
        info!(user_id = created.id, "user created");
        Ok(created)
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserAccount, ServiceError> {
        self.call(ApiRequest::put_json(format!("{USERS_PATH}/{id}"), update)?).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        self.call_empty(ApiRequest::delete(format!("{USERS_PATH}/{id}"))).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    #[instrument(skip(self, store), fields(store_id = %store.store_id))]
    pub async fn create_store(&self, store: NewStore) -> Result<StoreListing, ServiceError> {
        store.validate()?;
        let created: StoreListing = self.call(ApiRequest::post_json(STORES_PATH, &store)?).await?;
        info!("store created");
        Ok(created)
    }

    pub async fn get_store(&self, store_id: &str) -> Result<StoreListing, ServiceError> {
        self.call(ApiRequest::get(store_path(store_id))).await
    }

    pub async fn update_store(&self, store_id: &str, update: &StoreUpdate) -> Result<StoreListing, ServiceError> {
        self.call(ApiRequest::patch_json(store_path(store_id), update)?).await
    }

    pub async fn delete_store(&self, store_id: &str) -> Result<(), ServiceError> {
        self.call_empty(ApiRequest::delete(store_path(store_id))).await?;
        info!(store_id, "store deleted");
        Ok(())
    }

    /// Delete whichever record the row holds.
    pub async fn delete(&self, record: &AdminRecord) -> Result<(), ServiceError> {
        match record {
            AdminRecord::Store(store) => self.delete_store(&store.store_id).await,
            AdminRecord::User(user) => self.delete_user(user.id).await,
        }
    }

    /// Upload a CSV of stores. Rows the backend rejects are counted in `errors`.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import_stores(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImportStats, ServiceError> {
        let report: ImportReport = self.call(ApiRequest::upload(IMPORT_PATH, "file", file_name, bytes)).await?;
        info!(
            created = report.stats.created,
            updated = report.stats.updated,
            errors = report.stats.errors,
            "store import finished"
        );
        Ok(report.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStore;
    use crate::transport::mock::MockTransport;
    use crate::transport::{ApiResponse, Method, RequestBody, StatusCode};
    use models::errors::ValidationError;
    use models::session::Session;
    use serde_json::json;

    fn admin(mock: MockTransport) -> (AdminClient<MockTransport>, Arc<MockTransport>) {
        let transport = Arc::new(mock);
        let store = MemorySessionStore::with_session(Session::new("access", "refresh"));
        let session = Arc::new(SessionManager::new(transport.clone(), Arc::new(store)));
        (AdminClient::new(session, &SearchConfig::default()), transport)
    }

    fn ok_empty() -> MockTransport {
        MockTransport::new(|_| Ok(ApiResponse::empty(StatusCode::NO_CONTENT)))
    }

    #[tokio::test]
    async fn delete_dispatches_on_variant() -> Result<(), ServiceError> {
        let (client, transport) = admin(ok_empty());
        let store = AdminRecord::Store(StoreListing { store_id: "S-9".into(), ..StoreListing::default() });
        let user = AdminRecord::User(UserAccount { id: 7, email: "a@b.c".into(), is_active: true, role_id: None });
        client.delete(&store).await?;
        client.delete(&user).await?;

        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::DELETE);
        assert_eq!(sent[0].path, "/admin/stores/S-9");
        assert_eq!(sent[1].path, "/admin/users/7");
        assert!(sent.iter().all(|r| r.bearer.as_deref() == Some("access")));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_user_never_hits_the_network() {
        let (client, transport) = admin(ok_empty());
        let err = client.create_user(NewUser::new("not-an-email", "pw", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::InvalidEmail)));
        let err = client.create_user(NewUser::new("a@b.c", "", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::MissingField("password"))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_store_never_hits_the_network() {
        let (client, transport) = admin(ok_empty());
        let store = NewStore { store_id: "S-1".into(), name: "Main".into(), ..NewStore::default() };
        let err = client.create_store(store).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::MissingField("address_postal_code"))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn create_user_sends_active_account() -> Result<(), ServiceError> {
        let (client, transport) = admin(MockTransport::new(|_| {
            Ok(ApiResponse::json(StatusCode::CREATED, &json!({ "id": 3, "email": "ops@example.com", "role_id": 2 })))
        }));
        let created = client.create_user(NewUser::new("ops@example.com", "s3cret", 2)).await?;
        assert_eq!(created.id, 3);
        let RequestBody::Json(body) = &transport.requests()[0].body else { panic!("expected json body") };
        assert_eq!(body["is_active"], true);
        assert_eq!(body["role_id"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn store_listing_is_nationwide_and_paged() -> Result<(), ServiceError> {
        let (client, transport) = admin(MockTransport::new(|_| {
            Ok(ApiResponse::json(StatusCode::OK, &json!({ "results": [{ "store_id": "S-1", "name": "Main" }], "total": 31 })))
        }));
        let listing = client.list(AdminTab::Stores, 2).await?;
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.records[0].tab(), AdminTab::Stores);
        assert_eq!(listing.pagination, Some(PaginationState::new(2, 10, 31)));

        let RequestBody::Json(body) = &transport.requests()[0].body else { panic!("expected json body") };
        assert_eq!(body["filters"]["radius_miles"], 5000.0);
        assert!(body.get("zip_code").is_none() && body.get("address").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn user_listing_wraps_accounts() -> Result<(), ServiceError> {
        let (client, _) = admin(MockTransport::new(|_| {
            Ok(ApiResponse::json(StatusCode::OK, &json!([{ "id": 1, "email": "root@example.com", "is_active": true }])))
        }));
        let listing = client.list(AdminTab::Users, 1).await?;
        assert_eq!(listing.pagination, None);
        assert_eq!(listing.records[0].label(), "root@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn import_uploads_file_and_returns_stats() -> Result<(), ServiceError> {
        let (client, transport) = admin(MockTransport::new(|_| {
            Ok(ApiResponse::json(
                StatusCode::OK,
                &json!({ "message": "Import completed", "stats": { "created": 4, "updated": 1, "errors": 2 } }),
            ))
        }));
        let stats = client.import_stores("stores.csv", b"store_id,name\n".to_vec()).await?;
        assert_eq!(stats, ImportStats { created: 4, updated: 1, errors: 2 });

        let sent = &transport.requests()[0];
        assert_eq!(sent.path, IMPORT_PATH);
        assert!(matches!(&sent.body, RequestBody::File { field, file_name, .. } if field == "file" && file_name == "stores.csv"));
        Ok(())
    }

    #[tokio::test]
    async fn update_paths_and_methods() -> Result<(), ServiceError> {
        let (client, transport) = admin(MockTransport::new(|req| match req.method {
            Method::PUT => Ok(ApiResponse::json(StatusCode::OK, &json!({ "id": 5, "email": "x@y.z", "is_active": false }))),
            _ => Ok(ApiResponse::json(StatusCode::OK, &json!({ "store_id": "S-2", "name": "Renamed" }))),
        }));
        let user = client.update_user(5, &UserUpdate { is_active: Some(false), ..UserUpdate::default() }).await?;
        assert!(!user.is_active);
        let store = client.update_store("S-2", &StoreUpdate { name: Some("Renamed".into()), ..StoreUpdate::default() }).await?;
        assert_eq!(store.name, "Renamed");
        client.get_store("S-2").await?;

        let sent = transport.requests();
        assert_eq!((sent[0].method.clone(), sent[0].path.as_str()), (Method::PUT, "/admin/users/5"));
        assert_eq!((sent[1].method.clone(), sent[1].path.as_str()), (Method::PATCH, "/admin/stores/S-2"));
        assert_eq!((sent[2].method.clone(), sent[2].path.as_str()), (Method::GET, "/admin/stores/S-2"));
        Ok(())
    }

    #[tokio::test]
    async fn store_ids_are_encoded_as_one_segment() -> Result<(), ServiceError> {
        let (client, transport) = admin(ok_empty());
        client.delete_store("NY/5th Ave?x=1").await?;
        assert_eq!(transport.requests()[0].path, "/admin/stores/NY%2F5th%20Ave%3Fx%3D1");
        Ok(())
    }

    #[tokio::test]
    async fn not_found_surfaces_backend_detail() {
        let (client, _) = admin(MockTransport::new(|_| {
            Ok(ApiResponse::json(StatusCode::NOT_FOUND, &json!({ "detail": "Store not found" })))
        }));
        let err = client.get_store("missing").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Transport(crate::transport::TransportError::Status { status: 404, ref message }) if message == "Store not found"
        ));
    }
}
