use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use shop_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    gateway::StripeGateway,
    helpers::LogMailer,
    notifications::{HubHandle, NotificationHub},
    AuthApi,
    CheckoutApi,
    OrderStatusApi,
    ReportingApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::BearerAuthMiddlewareFactory,
    routes::{
        health,
        AllSalesRoute,
        AllSubscriptionsRoute,
        AllUsersRoute,
        AuthenticateRoute,
        CancelSubscriptionRoute,
        DeleteUserRoute,
        EditUserRoute,
        FetchSaleRoute,
        ForgotPasswordRoute,
        GetSaleRoute,
        IsAuthenticatedRoute,
        ItemRoute,
        NotificationsRoute,
        OneUserRoute,
        PaymentIntentRoute,
        PaymentSucceededRoute,
        RefundRoute,
        ResetPasswordRoute,
        SubscribeRoute,
        VerifyResetLinkRoute,
        VirtualTerminalRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let gateway = StripeGateway::new(&config.gateway.api_url, config.gateway.secret.clone(), config.gateway.timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (hub, _hub_task) = NotificationHub::spawn();
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, order_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers, hub)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks run after orders are created or annulled. Invoicing and customer emails attach here.
fn order_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            Box::pin(async move {
                info!("📬️ Order #{} ({}) created for {}. Invoice hook fired.", ev.order.id, ev.order.amount, ev.email);
            })
        })
        .on_order_annulled(|ev| {
            Box::pin(async move {
                info!("📬️ Order #{} is now {}", ev.order.id, ev.status);
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    producers: EventProducers,
    hub: HubHandle,
) -> Result<Server, ServerError> {
    // Built once so that every worker shares the same set of in-flight order transitions
    let order_status_api = OrderStatusApi::new(db.clone(), gateway.clone(), producers.clone());
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), producers.clone());
        let order_status_api = order_status_api.clone();
        let reporting_api = ReportingApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone(), config.auth.secret_key.clone())
            .with_frontend_url(config.auth.frontend_url.clone())
            .with_reset_link_minutes(config.auth.reset_link_minutes)
            .with_token_ttl(config.auth.token_ttl)
            .with_hub(hub.clone());
        let mailer = LogMailer::new(config.mail_from.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("shop::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(order_status_api))
            .app_data(web::Data::new(reporting_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(mailer))
            .app_data(web::Data::new(hub.clone()));
        // Routes that require a bearer token
        let admin_scope = web::scope("/admin")
            .wrap(BearerAuthMiddlewareFactory::<SqliteDatabase>::new())
            .service(VirtualTerminalRoute::<SqliteDatabase, StripeGateway>::new())
            .service(AllSalesRoute::<SqliteDatabase>::new())
            .service(AllSubscriptionsRoute::<SqliteDatabase>::new())
            .service(GetSaleRoute::<SqliteDatabase>::new())
            .service(FetchSaleRoute::<SqliteDatabase>::new())
            .service(RefundRoute::<SqliteDatabase, StripeGateway>::new())
            .service(CancelSubscriptionRoute::<SqliteDatabase, StripeGateway>::new())
            .service(AllUsersRoute::<SqliteDatabase>::new())
            .service(EditUserRoute::<SqliteDatabase>::new())
            .service(DeleteUserRoute::<SqliteDatabase>::new())
            .service(OneUserRoute::<SqliteDatabase>::new())
            .service(NotificationsRoute::new());
        let api_scope = web::scope("/api")
            .service(ItemRoute::<SqliteDatabase, StripeGateway>::new())
            .service(PaymentIntentRoute::<SqliteDatabase, StripeGateway>::new())
            .service(PaymentSucceededRoute::<SqliteDatabase, StripeGateway>::new())
            .service(SubscribeRoute::<SqliteDatabase, StripeGateway>::new())
            .service(AuthenticateRoute::<SqliteDatabase>::new())
            .service(IsAuthenticatedRoute::<SqliteDatabase>::new())
            .service(ForgotPasswordRoute::<SqliteDatabase, LogMailer>::new())
            .service(VerifyResetLinkRoute::<SqliteDatabase>::new())
            .service(ResetPasswordRoute::<SqliteDatabase>::new())
            .service(admin_scope);
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
