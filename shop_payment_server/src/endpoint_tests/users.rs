use actix_web::{http::StatusCode, web, web::ServiceConfig};
use shop_common::Secret;
use shop_payment_engine::{db_types::User, AuthApi, StoreError};

use super::{
    helpers::{admin_user, post_request, ADMIN_TOKEN},
    mocks::MockAuthManager,
};
use crate::{
    middleware::BearerAuthMiddlewareFactory,
    routes::{DeleteUserRoute, EditUserRoute, OneUserRoute},
};

const NEW_USER: &str = r#"{"first_name": "Bob", "last_name": "Builder", "email": "bob@example.com", "password": "hunter22"}"#;

#[actix_web::test]
async fn add_user() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_insert_user().times(1).returning(|update, hash| {
        assert_eq!(update.email, "bob@example.com");
        assert!(hash.starts_with("$2"));
        Ok(User { id: 2, first_name: update.first_name, last_name: update.last_name, email: update.email, ..admin_user() })
    });
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users/edit/0", NEW_USER, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"user saved","id":2}"#);
}

#[actix_web::test]
async fn add_user_without_password() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_insert_user().never();
    let body = r#"{"first_name": "Bob", "last_name": "Builder", "email": "bob@example.com"}"#;
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users/edit/0", body, configure(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("A new user must have a password"), "was: {body}");
}

#[actix_web::test]
async fn edit_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_update_user().times(1).returning(|id, _, _| Err(StoreError::NotFound(format!("user #{id}"))));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users/edit/8", NEW_USER, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("User #8 does not exist"), "was: {body}");
}

#[actix_web::test]
async fn fetch_one_user() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_fetch_user_by_id().returning(|id| Ok((id == 1).then(admin_user)));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users/1", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":1,"first_name":"Admin","last_name":"User","email":"admin@example.com"}"#);
}

#[actix_web::test]
async fn delete_user() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_delete_user().times(1).returning(|id| Ok(id == 3));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users/delete/3", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"user deleted","id":3}"#);
}

#[actix_web::test]
async fn delete_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = admin_backend();
    db.expect_delete_user().times(1).returning(|_| Ok(false));
    let (status, _) = post_request(ADMIN_TOKEN, "/admin/all-users/delete/4", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// A backend that already recognises the admin token. Tests add the expectations for the user operation under test.
fn admin_backend() -> MockAuthManager {
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().returning(|_, _| Ok(Some(admin_user())));
    db
}

fn configure(db: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AuthApi::new(db, Secret::new("endpoint test secret".to_string())).with_bcrypt_cost(4);
        let admin = web::scope("/admin")
            .wrap(BearerAuthMiddlewareFactory::<MockAuthManager>::new())
            .service(EditUserRoute::<MockAuthManager>::new())
            .service(DeleteUserRoute::<MockAuthManager>::new())
            .service(OneUserRoute::<MockAuthManager>::new());
        cfg.app_data(web::Data::new(api)).service(admin);
    }
}
