use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use shop_common::Cents;
use shop_payment_engine::{
    db_types::{Order, OrderStatusType},
    events::EventProducers,
    gateway::GatewayError,
    order_objects::{CustomerSummary, ItemSummary, OrderDetail, TransactionSummary},
    OrderStatusApi,
    ReportingApi,
    StoreError,
};

use super::{
    helpers::{admin_auth_api, get_request, post_request, ADMIN_TOKEN},
    mocks::{MockAuthManager, MockGateway, MockOrderManager},
};
use crate::{
    middleware::BearerAuthMiddlewareFactory,
    routes::{AllSalesRoute, AllSubscriptionsRoute, CancelSubscriptionRoute, FetchSaleRoute, GetSaleRoute, RefundRoute},
};

const REFUND: &str = r#"{"id": 5, "payment_intent": "pi_1", "amount": 2000, "currency": "usd"}"#;

#[actix_web::test]
async fn refund_cleared_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Cleared, "pi_1"))));
    db.expect_update_order_status().times(1).returning(|id, status| {
        assert_eq!(status, OrderStatusType::Refunded);
        Ok(order(id, status))
    });
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(1).returning(|intent, amount| {
        assert_eq!(intent.to_string(), "pi_1");
        assert_eq!(amount, Cents::from(2000));
        Ok(())
    });
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"Charge refunded","id":5}"#);
}

#[actix_web::test]
async fn refund_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().never();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().never();
    let (status, _) = post_request("", "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn refund_refunded_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Refunded, "pi_1"))));
    db.expect_update_order_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().never();
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":true,"message":"Order #5 is already Refunded and cannot be changed"}"#);
}

#[actix_web::test]
async fn declined_refund_leaves_order_alone() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Cleared, "pi_1"))));
    db.expect_update_order_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(1).returning(|_, _| Err(GatewayError::declined("card_declined")));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"error":true,"message":"Your card was declined"}"#);
}

#[actix_web::test]
async fn refund_that_cannot_be_recorded() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Cleared, "pi_1"))));
    db.expect_update_order_status().times(1).returning(|_, _| Err(StoreError::DatabaseError("disk I/O error".into())));
    let mut gateway = MockGateway::new();
    gateway.expect_refund().times(1).returning(|_, _| Ok(()));
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Order #5 must be reconciled by hand."), "was: {body}");
}

#[actix_web::test]
async fn refund_of_another_charge() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Cleared, "pi_other"))));
    db.expect_update_order_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_refund().never();
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/refund", REFUND, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":true,"message":"Order #5 does not match the request. It was not paid with pi_1"}"#);
}

#[actix_web::test]
async fn sale_lookup_failure() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail()
        .times(1)
        .returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    let (status, body) = get_request(ADMIN_TOKEN, "/admin/get-sale/5", reporting(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("locked"), "was: {body}");
}

#[actix_web::test]
async fn cancel_subscription() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().returning(|id| Ok(Some(detail(id, OrderStatusType::Cleared, "sub_1"))));
    db.expect_update_order_status().times(1).returning(|id, status| {
        assert_eq!(status, OrderStatusType::Cancelled);
        Ok(order(id, status))
    });
    let mut gateway = MockGateway::new();
    gateway
        .expect_cancel_subscription()
        .withf(|sub| sub.to_string() == "sub_1")
        .times(1)
        .returning(|_| Ok(()));
    let body = r#"{"id": 5, "payment_intent": "sub_1"}"#;
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/cancel-subscription", body, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"Subscription cancelled","id":5}"#);
}

#[actix_web::test]
async fn all_sales_pages() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_page()
        .withf(|filter| filter.is_recurring == Some(false) && filter.limit == Some(10) && filter.offset == Some(10))
        .times(1)
        .returning(|_| Ok((vec![], 25)));
    let body = r#"{"page_size": 10, "page": 2}"#;
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-sales", body, reporting(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current_page":2,"page_size":10,"last_page":3,"total_records":25,"orders":[]}"#);
}

#[actix_web::test]
async fn all_subscriptions_defaults_to_first_page() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_page()
        .withf(|filter| filter.is_recurring == Some(true) && filter.limit == Some(10) && filter.offset == Some(0))
        .times(1)
        .returning(|_| Ok((vec![], 0)));
    let (status, body) =
        post_request(ADMIN_TOKEN, "/admin/all-subscriptions", "{}", reporting(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""last_page":1"#), "was: {body}");
}

#[actix_web::test]
async fn invalid_page() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_orders_page().never();
    let body = r#"{"page_size": 10, "page": 0}"#;
    let (status, body) = post_request(ADMIN_TOKEN, "/admin/all-sales", body, reporting(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":true,"message":"page must be at least 1, not 0"}"#);
}

#[actix_web::test]
async fn unknown_sale() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_detail().times(1).returning(|_| Ok(None));
    let (status, body) = get_request(ADMIN_TOKEN, "/admin/get-sale/99", reporting(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order #99 does not exist"), "was: {body}");
}

fn order(id: i64, status: OrderStatusType) -> Order {
    Order {
        id,
        item_id: 1,
        transaction_id: id,
        customer_id: id,
        status_id: status,
        quantity: 1,
        amount: Cents::from(2000),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn detail(id: i64, status: OrderStatusType, payment_intent: &str) -> OrderDetail {
    let order = order(id, status);
    OrderDetail {
        id,
        item_id: order.item_id,
        transaction_id: order.transaction_id,
        customer_id: order.customer_id,
        status_id: status,
        quantity: order.quantity,
        amount: order.amount,
        created_at: order.created_at,
        updated_at: order.updated_at,
        item: ItemSummary { id: order.item_id, name: "Widget".into() },
        transaction: TransactionSummary {
            id: order.transaction_id,
            amount: order.amount,
            currency: "usd".into(),
            last_four: "4242".into(),
            expiry_month: 12,
            expiry_year: 2030,
            payment_intent: payment_intent.into(),
            bank_return_code: "ch_1".into(),
        },
        customer: CustomerSummary {
            id: order.customer_id,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
        },
    }
}

fn configure(db: MockOrderManager, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| admin_app(cfg, db, MockOrderManager::new(), gateway)
}

fn reporting(db: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| admin_app(cfg, MockOrderManager::new(), db, MockGateway::new())
}

fn admin_app(cfg: &mut ServiceConfig, status_db: MockOrderManager, reporting_db: MockOrderManager, gateway: MockGateway) {
    let status_api = OrderStatusApi::new(status_db, gateway, EventProducers::default());
    let reporting_api = ReportingApi::new(reporting_db);
    let admin = web::scope("/admin")
        .wrap(BearerAuthMiddlewareFactory::<MockAuthManager>::new())
        .service(AllSalesRoute::<MockOrderManager>::new())
        .service(AllSubscriptionsRoute::<MockOrderManager>::new())
        .service(GetSaleRoute::<MockOrderManager>::new())
        .service(FetchSaleRoute::<MockOrderManager>::new())
        .service(RefundRoute::<MockOrderManager, MockGateway>::new())
        .service(CancelSubscriptionRoute::<MockOrderManager, MockGateway>::new());
    cfg.app_data(web::Data::new(admin_auth_api()))
        .app_data(web::Data::new(reporting_api))
        .app_data(web::Data::new(status_api))
        .service(admin);
}
