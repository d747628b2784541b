use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use shop_common::Secret;
use shop_payment_engine::{db_types::User, AuthApi};

use super::mocks::MockAuthManager;

/// A well-formed bearer token. Whether it is accepted depends on what the mocked backend returns for its hash.
pub const ADMIN_TOKEN: &str = "abcdefghijklmnopqrstuvwxyz";

pub fn admin_user() -> User {
    User {
        id: 1,
        first_name: "Admin".into(),
        last_name: "User".into(),
        email: "admin@example.com".into(),
        password: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

/// An auth API that accepts [`ADMIN_TOKEN`] as belonging to [`admin_user`].
pub fn admin_auth_api() -> AuthApi<MockAuthManager> {
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().returning(|_, _| Ok(Some(admin_user())));
    AuthApi::new(db, Secret::new("endpoint test secret".to_string())).with_bcrypt_cost(4)
}

pub async fn post_request(
    auth_token: &str,
    path: &str,
    body: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    if !auth_token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_token}")));
    }
    call(req.set_payload(body.to_string()), configure).await
}

pub async fn get_request(
    auth_token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !auth_token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_token}")));
    }
    call(req, configure).await
}

async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = req.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    // Errors raised by middleware come back as `Err` rather than as a response
    let (status, bytes) = match test::try_call_service(&service, req).await {
        Ok(res) => (res.status(), res.into_body().try_into_bytes().unwrap_or_default()),
        Err(e) => {
            let res = e.error_response();
            (res.status(), res.into_body().try_into_bytes().unwrap_or_default())
        },
    };
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
