use actix_web::{http::StatusCode, web, web::ServiceConfig};
use log::*;
use shop_common::Secret;
use shop_payment_engine::{
    db_types::User,
    helpers::{hash_password, LogMailer},
    AuthApi,
};

use super::{
    helpers::{admin_user, post_request, ADMIN_TOKEN},
    mocks::MockAuthManager,
};
use crate::{
    middleware::BearerAuthMiddlewareFactory,
    routes::{AllUsersRoute, AuthenticateRoute, ForgotPasswordRoute, IsAuthenticatedRoute},
};

const DENIED: &str = r#"{"error":true,"message":"invalid auth credentials"}"#;

#[actix_web::test]
async fn login_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_by_email().withf(|email| email.to_string() == "admin@example.com").returning(|_| Ok(Some(with_password())));
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(admin_user())));
    db.expect_replace_token().times(1).returning(|token| {
        assert_eq!(token.user_id, 1);
        assert_eq!(token.hash.len(), 32);
        Ok(())
    });
    let body = r#"{"email": " Admin@Example.com", "password": "secret123"}"#;
    let (status, body) = post_request("", "/authenticate", body, configure(db)).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], false);
    assert_eq!(json["authentication_token"]["token"].as_str().unwrap().len(), 26);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(Some(with_password())));
    db.expect_replace_token().never();
    let body = r#"{"email": "admin@example.com", "password": "letmein"}"#;
    let (status, body) = post_request("", "/authenticate", body, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, DENIED);
}

#[actix_web::test]
async fn login_as_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(None));
    db.expect_replace_token().never();
    let body = r#"{"email": "nobody@example.com", "password": "secret123"}"#;
    let (status, body) = post_request("", "/authenticate", body, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, DENIED);
}

#[actix_web::test]
async fn admin_route_without_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().never();
    db.expect_fetch_all_users().never();
    let (status, body) = post_request("", "/admin/all-users", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, DENIED);
}

#[actix_web::test]
async fn admin_route_with_short_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    // Tokens of the wrong length never reach storage
    db.expect_fetch_user_for_token().never();
    db.expect_fetch_all_users().never();
    let (status, _) = post_request("abc123", "/admin/all-users", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_route_with_expired_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().times(1).returning(|_, _| Ok(None));
    db.expect_fetch_all_users().never();
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, DENIED);
}

#[actix_web::test]
async fn admin_route_with_valid_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().times(1).returning(|_, _| Ok(Some(admin_user())));
    db.expect_fetch_all_users().times(1).returning(|| Ok(vec![admin_user()]));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-users", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    // Password hashes and timestamps stay on the server
    assert_eq!(body, r#"[{"id":1,"first_name":"Admin","last_name":"User","email":"admin@example.com"}]"#);
}

#[actix_web::test]
async fn is_authenticated() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_for_token().returning(|_, _| Ok(Some(admin_user())));
    let (status, body) = post_request(ADMIN_TOKEN, "/is-authenticated", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"authenticated user admin@example.com"}"#);

    let db = MockAuthManager::new();
    let (status, body) = post_request("", "/is-authenticated", "{}", configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, DENIED);
}

#[actix_web::test]
async fn forgot_password_does_not_reveal_accounts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(None));
    let body = r#"{"email": "stranger@example.com"}"#;
    let (status, body) = post_request("", "/forgot-password", body, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""error":false"#), "was: {body}");
}

fn with_password() -> User {
    User { password: hash_password("secret123", 4).unwrap(), ..admin_user() }
}

fn configure(db: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AuthApi::new(db, Secret::new("endpoint test secret".to_string())).with_bcrypt_cost(4);
        let admin = web::scope("/admin")
            .wrap(BearerAuthMiddlewareFactory::<MockAuthManager>::new())
            .service(AllUsersRoute::<MockAuthManager>::new());
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(LogMailer::default()))
            .service(AuthenticateRoute::<MockAuthManager>::new())
            .service(IsAuthenticatedRoute::<MockAuthManager>::new())
            .service(ForgotPasswordRoute::<MockAuthManager, LogMailer>::new())
            .service(admin);
    }
}
