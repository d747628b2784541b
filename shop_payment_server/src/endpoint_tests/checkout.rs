use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use shop_common::Cents;
use shop_payment_engine::{
    db_types::{Item, Order, OrderStatusType},
    events::EventProducers,
    gateway::{CardDetails, GatewayCustomer, GatewayError, PaymentIntent, PaymentMethodDetails, Subscription},
    CheckoutApi,
    StoreError,
};

use super::{
    helpers::{get_request, post_request},
    mocks::{MockCheckoutManager, MockGateway},
};
use crate::routes::{health, ItemRoute, PaymentIntentRoute, PaymentSucceededRoute, SubscribeRoute};

const CARD_CHECKOUT: &str = r#"{
    "first_name": "Jane",
    "last_name": "Doe",
    "email": "jane@example.com",
    "payment_intent": "pi_1",
    "payment_method": "pm_1",
    "amount": 2000,
    "currency": "usd",
    "item_id": 1,
    "quantity": 1
}"#;

#[actix_web::test]
async fn health_check() {
    let (status, body) = get_request("", "/health", |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn fetch_item() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item().returning(|id| Ok((id == 1).then(|| widget(""))));
    let (status, body) = get_request("", "/item/1", configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""name":"Widget""#), "was: {body}");

    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item().returning(|_| Ok(None));
    let (status, body) = get_request("", "/item/7", configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Item #7 does not exist"), "was: {body}");
}

#[actix_web::test]
async fn storage_failures_are_not_shown_to_clients() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item()
        .times(1)
        .returning(|_| Err(StoreError::DatabaseError("no such table: items".into())));
    let (status, body) = get_request("", "/item/1", configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":true,"message":"The request could not be completed"}"#);
}

#[actix_web::test]
async fn create_payment_intent() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_charge().times(1).returning(|currency, amount| {
        assert_eq!(currency.to_string(), "usd");
        assert_eq!(amount, Cents::from(2000));
        Ok(PaymentIntent { id: "pi_1".into(), client_secret: Some("pi_1_secret".into()), ..Default::default() })
    });
    let (status, body) =
        post_request("", "/payment-intent", r#"{"amount": 2000}"#, configure(MockCheckoutManager::new(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":"pi_1","client_secret":"pi_1_secret"}"#);
}

#[actix_web::test]
async fn payment_intent_for_nothing() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_charge().never();
    let body = r#"{"amount": 0, "currency": "usd"}"#;
    let (status, body) = post_request("", "/payment-intent", body, configure(MockCheckoutManager::new(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":true,"message":"Cannot charge $0.00"}"#);
}

#[actix_web::test]
async fn payment_succeeded() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item().returning(|_| Ok(Some(widget(""))));
    db.expect_assemble_order().times(1).returning(|customer, transaction, order| {
        assert_eq!(customer.email, "jane@example.com");
        assert_eq!(transaction.last_four, "4242");
        assert_eq!((transaction.expiry_month, transaction.expiry_year), (12, 2030));
        assert_eq!(transaction.payment_intent, "pi_1");
        assert_eq!(transaction.bank_return_code, "ch_1");
        assert_eq!(order.amount, Cents::from(2000));
        Ok(new_order(42))
    });
    let (status, body) = post_request("", "/payment-succeeded", CARD_CHECKOUT, configure(db, card_gateway())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"Order saved","id":42}"#);
}

#[actix_web::test]
async fn payment_succeeded_with_declined_card() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item().returning(|_| Ok(Some(widget(""))));
    db.expect_assemble_order().never();
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_payment_intent().returning(|_| Err(GatewayError::declined("expired_card")));
    let (status, body) = post_request("", "/payment-succeeded", CARD_CHECKOUT, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"error":true,"message":"Your card is expired"}"#);
}

#[actix_web::test]
async fn subscribe_uses_the_items_plan() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCheckoutManager::new();
    db.expect_fetch_item().returning(|_| Ok(Some(widget("price_gold"))));
    db.expect_assemble_order().times(1).returning(|_, transaction, order| {
        assert_eq!(transaction.payment_intent, "sub_1");
        assert_eq!(order.quantity, 1);
        Ok(new_order(7))
    });
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_customer()
        .times(1)
        .returning(|_, email| Ok(GatewayCustomer { id: "cus_9".into(), email: Some(email.to_string()) }));
    gateway
        .expect_subscribe_to_plan()
        .withf(|customer, plan, _, _, _| customer.to_string() == "cus_9" && plan.to_string() == "price_gold")
        .times(1)
        .returning(|_, _, _, _, _| Ok(Subscription { id: "sub_1".into(), status: "active".into() }));
    let body = r#"{
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com",
        "payment_method": "pm_1",
        "item_id": 2,
        "amount": 1500,
        "last_four": "4242",
        "expiry_month": 12,
        "expiry_year": 2030
    }"#;
    let (status, body) =
        post_request("", "/create-customer-and-subscribe-to-plan", body, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"error":false,"message":"Subscription sub_1 created","id":7}"#);
}

fn widget(plan_id: &str) -> Item {
    Item {
        id: 1,
        name: "Widget".into(),
        description: "A very nice widget".into(),
        inventory_level: 10,
        price: Cents::from(1000),
        image: String::new(),
        is_recurring: !plan_id.is_empty(),
        plan_id: plan_id.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn new_order(id: i64) -> Order {
    Order {
        id,
        item_id: 1,
        transaction_id: 1,
        customer_id: 1,
        status_id: OrderStatusType::Cleared,
        quantity: 1,
        amount: Cents::from(2000),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn card_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_payment_intent().returning(|id| {
        Ok(PaymentIntent { id: id.to_string(), latest_charge: Some("ch_1".into()), ..Default::default() })
    });
    gateway.expect_get_payment_method().returning(|id| {
        let card = CardDetails { brand: "visa".into(), last4: "4242".into(), exp_month: 12, exp_year: 2030 };
        Ok(PaymentMethodDetails { id: id.to_string(), card: Some(card) })
    });
    gateway
}

fn configure(db: MockCheckoutManager, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CheckoutApi::new(db, gateway, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(ItemRoute::<MockCheckoutManager, MockGateway>::new())
            .service(PaymentIntentRoute::<MockCheckoutManager, MockGateway>::new())
            .service(PaymentSucceededRoute::<MockCheckoutManager, MockGateway>::new())
            .service(SubscribeRoute::<MockCheckoutManager, MockGateway>::new());
    }
}
