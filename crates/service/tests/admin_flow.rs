use std::sync::Arc;

use configs::SearchConfig;
use models::admin::{parse_services, AdminRecord, AdminTab, NewStore};
use models::session::Session;
use models::store::Address;
use serde_json::json;
use service::auth::session::REFRESH_PATH;
use service::auth::{MemorySessionStore, SessionManager};
use service::clients::AdminClient;
use service::errors::ServiceError;
use service::transport::mock::MockTransport;
use service::transport::{ApiResponse, Method, RequestBody, StatusCode};

fn admin(transport: MockTransport, session: Session) -> (AdminClient<MockTransport>, Arc<SessionManager<MockTransport>>, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let store = Arc::new(MemorySessionStore::with_session(session));
    let session = Arc::new(SessionManager::new(transport.clone(), store));
    (AdminClient::new(session.clone(), &SearchConfig::default()), session, transport)
}

#[tokio::test]
async fn list_then_delete_each_row() -> Result<(), ServiceError> {
    let backend = MockTransport::new(|req| match (req.method.clone(), req.path.as_str()) {
        (Method::GET, "/admin/users") => Ok(ApiResponse::json(
            StatusCode::OK,
            &json!([{ "id": 1, "email": "a@example.com" }, { "id": 2, "email": "b@example.com", "is_active": false }]),
        )),
        (Method::POST, "/stores/search") => Ok(ApiResponse::json(
            StatusCode::OK,
            &json!({ "results": [{ "store_id": "S-1", "name": "Main" }], "total": 1 }),
        )),
        (Method::DELETE, _) => Ok(ApiResponse::json(StatusCode::OK, &json!({ "message": "deleted" }))),
        _ => Ok(ApiResponse::empty(StatusCode::NOT_FOUND)),
    });
    let (client, _, transport) = admin(backend, Session::new("tok", "ref"));

    let mut rows = client.list(AdminTab::Users, 1).await?.records;
    rows.extend(client.list(AdminTab::Stores, 1).await?.records);
    assert_eq!(rows.len(), 3);
    for row in &rows {
        client.delete(row).await?;
    }

    let deletes: Vec<_> = transport.requests().into_iter().filter(|r| r.method == Method::DELETE).map(|r| r.path).collect();
    assert_eq!(deletes, vec!["/admin/users/1", "/admin/users/2", "/admin/stores/S-1"]);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_renewed_mid_admin_session() -> Result<(), ServiceError> {
    let backend = MockTransport::new(|req| {
        if req.path == REFRESH_PATH {
            return Ok(ApiResponse::json(StatusCode::OK, &json!({ "access_token": "fresh", "refresh_token": "ref-2" })));
        }
        if req.bearer() != Some("fresh") {
            return Ok(ApiResponse::json(StatusCode::UNAUTHORIZED, &json!({ "detail": "Token expired" })));
        }
        Ok(ApiResponse::json(StatusCode::CREATED, &json!({ "store_id": "S-77", "name": "Harbor", "address_postal_code": "02110" })))
    });
    let (client, session, transport) = admin(backend, Session::new("stale", "ref-1"));

    let store = NewStore {
        store_id: "S-77".into(),
        name: "Harbor".into(),
        address: Address { postal_code: "02110".into(), ..Address::default() },
        services: parse_services("pharmacy, atm ,,"),
        ..NewStore::default()
    };
    let created = client.create_store(store).await?;
    assert_eq!(created.address.postal_code, "02110");
    assert_eq!(session.session(), Session::new("fresh", "ref-2"));

    let posts: Vec<_> = transport.requests().into_iter().filter(|r| r.path == "/admin/stores").collect();
    assert_eq!(posts.len(), 2);
    let RequestBody::Json(body) = &posts[1].body else { panic!("expected json body") };
    assert_eq!(body["services"], json!(["pharmacy", "atm"]));
    assert_eq!(body["store_type"], "regular");
    assert_eq!(body["hours_mon"], "09:00-17:00");
    Ok(())
}

#[tokio::test]
async fn revoked_session_ends_admin_work() {
    let backend = MockTransport::new(|req| {
        if req.path == REFRESH_PATH {
            return Ok(ApiResponse::json(StatusCode::UNAUTHORIZED, &json!({ "detail": "Invalid token" })));
        }
        Ok(ApiResponse::json(StatusCode::UNAUTHORIZED, &json!({ "detail": "Token expired" })))
    });
    let (client, session, _) = admin(backend, Session::new("stale", "revoked"));
    let user = AdminRecord::User(models::admin::UserAccount { id: 4, email: "x@y.z".into(), is_active: true, role_id: None });
    let err = client.delete(&user).await.unwrap_err();
    assert!(err.is_session_expired());
    assert!(!session.is_authenticated());
}
