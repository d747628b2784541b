use chrono::{DateTime, Utc};
use mockall::mock;
use shop_common::Cents;
use shop_payment_engine::{
    db_types::{Item, NewCustomer, NewOrder, NewToken, NewTransaction, Order, OrderStatusType, Transaction, User, UserUpdate},
    gateway::{GatewayCustomer, GatewayError, PaymentGateway, PaymentIntent, PaymentMethodDetails, Subscription},
    order_objects::{OrderDetail, OrderQueryFilter},
    AuthManagement,
    CheckoutManagement,
    OrderManagement,
    StoreError,
};

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;
        async fn fetch_all_users(&self) -> Result<Vec<User>, StoreError>;
        async fn insert_user(&self, user: UserUpdate, password_hash: &str) -> Result<User, StoreError>;
        async fn update_user<'a>(&self, user_id: i64, update: UserUpdate, password_hash: Option<&'a str>) -> Result<User, StoreError>;
        async fn update_password_for_email(&self, email: &str, password_hash: &str) -> Result<(), StoreError>;
        async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError>;
        async fn replace_token(&self, token: NewToken) -> Result<(), StoreError>;
        async fn fetch_user_for_token(&self, token_hash: &[u8], now: DateTime<Utc>) -> Result<Option<User>, StoreError>;
    }
}

mock! {
    pub CheckoutManager {}
    impl CheckoutManagement for CheckoutManager {
        async fn fetch_item(&self, item_id: i64) -> Result<Option<Item>, StoreError>;
        async fn assemble_order(&self, customer: NewCustomer, transaction: NewTransaction, order: NewOrder) -> Result<Order, StoreError>;
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError>;
    }
}

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, StoreError>;
        async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreError>;
        async fn fetch_orders_page(&self, filter: OrderQueryFilter) -> Result<(Vec<OrderDetail>, i64), StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn charge(&self, currency: &str, amount: Cents) -> Result<PaymentIntent, GatewayError>;
        async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError>;
        async fn get_payment_method(&self, id: &str) -> Result<PaymentMethodDetails, GatewayError>;
        async fn create_customer(&self, payment_method: &str, email: &str) -> Result<GatewayCustomer, GatewayError>;
        async fn subscribe_to_plan<'a>(&self, customer_ref: &str, plan_ref: &str, email: &str, last_four: &str, coupon: Option<&'a str>) -> Result<Subscription, GatewayError>;
        async fn refund(&self, payment_intent: &str, amount: Cents) -> Result<(), GatewayError>;
        async fn cancel_subscription(&self, subscription_ref: &str) -> Result<(), GatewayError>;
    }
}
