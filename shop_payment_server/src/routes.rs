//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into the engine APIs. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async, and all storage and gateway work is
//! awaited, so a worker can serve other requests while one is waiting on SQLite or the card processor.
//!
//! Routes under `/api/admin` are registered in a scope that is wrapped by the bearer token middleware (see
//! [`crate::middleware`]), so the handlers there can assume an authenticated [`AdminUser`].
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bytes::Bytes;
use futures::stream;
use log::*;
use shop_payment_engine::{
    checkout_objects::{CardCheckout, SubscriptionCheckout, VirtualTerminalPayment},
    gateway::PaymentGateway,
    helpers::Mailer,
    notifications::{ChannelSink, HubHandle},
    AuthApi,
    AuthManagement,
    CheckoutApi,
    CheckoutManagement,
    OrderManagement,
    OrderStatusApi,
    ReportingApi,
};

use crate::{
    data_objects::{
        AuthenticationResponse,
        Credentials,
        ForgotPasswordRequest,
        JsonResponse,
        PageRequest,
        PaymentIntentRequest,
        PaymentIntentResponse,
        ResetPasswordRequest,
        StatusChangeRequest,
        UserEditRequest,
        VerifyResetLinkRequest,
        VerifyResetLinkResponse,
    },
    errors::ServerError,
    middleware::AdminUser,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalogue  ----------------------------------------------------
route!(item => Get "/item/{id}" impl CheckoutManagement, PaymentGateway);
pub async fn item<B: CheckoutManagement, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET item #{id}");
    let item = api.fetch_item(id).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(payment_intent => Post "/payment-intent" impl CheckoutManagement, PaymentGateway);
/// Creates a payment intent at the gateway. The client secret is handed to the browser, which confirms the card
/// payment directly with the gateway before calling `/payment-succeeded`.
pub async fn payment_intent<B: CheckoutManagement, G: PaymentGateway>(
    body: web::Json<PaymentIntentRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let PaymentIntentRequest { amount, currency } = body.into_inner();
    debug!("💻️ POST payment intent for {amount} {currency}");
    let intent = api.create_payment_intent(&currency, amount).await?;
    Ok(HttpResponse::Ok().json(PaymentIntentResponse { id: intent.id, client_secret: intent.client_secret }))
}

route!(payment_succeeded => Post "/payment-succeeded" impl CheckoutManagement, PaymentGateway);
pub async fn payment_succeeded<B: CheckoutManagement, G: PaymentGateway>(
    body: web::Json<CardCheckout>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let checkout = body.into_inner();
    debug!("💻️ POST payment succeeded for item #{} ({})", checkout.item_id, checkout.payment_intent);
    let order_id = api.card_checkout(checkout).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order saved").with_id(order_id)))
}

route!(subscribe => Post "/create-customer-and-subscribe-to-plan" impl CheckoutManagement, PaymentGateway);
pub async fn subscribe<B: CheckoutManagement, G: PaymentGateway>(
    body: web::Json<SubscriptionCheckout>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let checkout = body.into_inner();
    debug!("💻️ POST subscription for item #{} by {}", checkout.item_id, checkout.email);
    let receipt = api.subscription_checkout(checkout).await?;
    let response = JsonResponse::success(format!("Subscription {} created", receipt.subscription_id));
    Ok(HttpResponse::Ok().json(response.with_id(receipt.order_id)))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(authenticate => Post "/authenticate" impl AuthManagement);
pub async fn authenticate<A: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { email, password } = body.into_inner();
    trace!("💻️ POST authenticate for {email}");
    let token = api.login(&email, &password).await?;
    let response = AuthenticationResponse {
        error: false,
        message: format!("token for {email} created"),
        authentication_token: token,
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(is_authenticated => Post "/is-authenticated" impl AuthManagement);
pub async fn is_authenticated<A: AuthManagement>(
    req: HttpRequest,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let header = req.headers().get(actix_web::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let user = api.validate_request(header).await?;
    trace!("💻️ Token for user #{} is valid", user.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("authenticated user {}", user.email))))
}

route!(forgot_password => Post "/forgot-password" impl AuthManagement, Mailer);
pub async fn forgot_password<A: AuthManagement, M: Mailer>(
    body: web::Json<ForgotPasswordRequest>,
    api: web::Data<AuthApi<A>>,
    mailer: web::Data<M>,
) -> Result<HttpResponse, ServerError> {
    let ForgotPasswordRequest { email } = body.into_inner();
    debug!("💻️ POST forgot password for {email}");
    api.forgot_password(&email, mailer.get_ref()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("If the address has an account, a reset link is on its way")))
}

route!(verify_reset_link => Post "/verify-reset-link" impl AuthManagement);
pub async fn verify_reset_link<A: AuthManagement>(
    body: web::Json<VerifyResetLinkRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let VerifyResetLinkRequest { url, email } = body.into_inner();
    trace!("💻️ POST verify reset link for {email}");
    let encrypted = api.verify_reset_link(&url, &email).await?;
    Ok(HttpResponse::Ok().json(VerifyResetLinkResponse {
        error: false,
        message: "verified".to_string(),
        email: encrypted,
    }))
}

route!(reset_password => Post "/reset-password" impl AuthManagement);
pub async fn reset_password<A: AuthManagement>(
    body: web::Json<ResetPasswordRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let ResetPasswordRequest { email, password } = body.into_inner();
    trace!("💻️ POST reset password");
    api.reset_password(&email, &password).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("password changed")))
}

//----------------------------------------------   Admin: terminal  ----------------------------------------------------
route!(virtual_terminal => Post "/virtual-terminal-succeeded" impl CheckoutManagement, PaymentGateway);
pub async fn virtual_terminal<B: CheckoutManagement, G: PaymentGateway>(
    admin: AdminUser,
    body: web::Json<VirtualTerminalPayment>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment = body.into_inner();
    info!("💻️ POST virtual terminal payment of {} by user #{}", payment.amount, admin.0.id);
    let transaction = api.virtual_terminal_payment(payment).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

//----------------------------------------------   Admin: reporting  ----------------------------------------------------
route!(all_sales => Post "/all-sales" impl OrderManagement);
pub async fn all_sales<B: OrderManagement>(
    body: web::Json<PageRequest>,
    api: web::Data<ReportingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PageRequest { page_size, page } = body.into_inner();
    trace!("💻️ POST all sales, page {page} ({page_size} per page)");
    let orders = api.list_orders(false, page_size, page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(all_subscriptions => Post "/all-subscriptions" impl OrderManagement);
pub async fn all_subscriptions<B: OrderManagement>(
    body: web::Json<PageRequest>,
    api: web::Data<ReportingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PageRequest { page_size, page } = body.into_inner();
    trace!("💻️ POST all subscriptions, page {page} ({page_size} per page)");
    let orders = api.list_orders(true, page_size, page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(get_sale => Post "/get-sale/{id}" impl OrderManagement);
pub async fn get_sale<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ReportingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ Fetching sale #{id}");
    let order = api.get_order(id).await?;
    Ok(HttpResponse::Ok().json(order))
}

// The admin console fetches single sales with GET as well as POST
route!(fetch_sale => Get "/get-sale/{id}" impl OrderManagement);
pub async fn fetch_sale<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ReportingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    get_sale(path, api).await
}

//----------------------------------------------   Admin: order status  ----------------------------------------------------
route!(refund => Post "/refund" impl OrderManagement, PaymentGateway);
pub async fn refund<B: OrderManagement, G: PaymentGateway>(
    admin: AdminUser,
    body: web::Json<StatusChangeRequest>,
    api: web::Data<OrderStatusApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    info!("💻️ POST refund of order #{} ({} {}) by user #{}", req.id, req.amount, req.currency, admin.0.id);
    api.refund_charge(req.id, &req.payment_intent, req.amount, &req.currency).await.into_result()?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Charge refunded").with_id(req.id)))
}

route!(cancel_subscription => Post "/cancel-subscription" impl OrderManagement, PaymentGateway);
pub async fn cancel_subscription<B: OrderManagement, G: PaymentGateway>(
    admin: AdminUser,
    body: web::Json<StatusChangeRequest>,
    api: web::Data<OrderStatusApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    info!("💻️ POST cancel subscription {} of order #{} by user #{}", req.payment_intent, req.id, admin.0.id);
    api.cancel_subscription(req.id, &req.payment_intent).await.into_result()?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Subscription cancelled").with_id(req.id)))
}

//----------------------------------------------   Admin: users  ----------------------------------------------------
route!(all_users => Post "/all-users" impl AuthManagement);
pub async fn all_users<A: AuthManagement>(api: web::Data<AuthApi<A>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST all users");
    let users = api.all_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(one_user => Post "/all-users/{id}" impl AuthManagement);
pub async fn one_user<A: AuthManagement>(
    path: web::Path<i64>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ POST user #{id}");
    let user = api.get_user(id).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(edit_user => Post "/all-users/edit/{id}" impl AuthManagement);
/// Adds a user when `id` is 0, and edits user `id` otherwise.
pub async fn edit_user<A: AuthManagement>(
    admin: AdminUser,
    path: web::Path<i64>,
    body: web::Json<UserEditRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ POST edit user #{id} by user #{}", admin.0.id);
    let (update, password) = body.into_inner().into_parts();
    let user = api.save_user(id, update, password.as_deref()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("user saved").with_id(user.id)))
}

route!(delete_user => Post "/all-users/delete/{id}" impl AuthManagement);
pub async fn delete_user<A: AuthManagement>(
    admin: AdminUser,
    path: web::Path<i64>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ POST delete user #{id} by user #{}", admin.0.id);
    api.delete_user(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("user deleted").with_id(id)))
}

//----------------------------------------------   Admin: notifications  ----------------------------------------------------
route!(notifications => Get "/notifications");
/// Streams hub broadcasts to the admin console as server-sent events. The hub drops the connection the first time a
/// delivery fails after the client has gone away.
pub async fn notifications(admin: AdminUser, hub: web::Data<HubHandle>) -> Result<HttpResponse, ServerError> {
    let (sink, receiver) = ChannelSink::new();
    let id = hub.register(sink).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    debug!("💻️📬️ User #{} subscribed to notifications as connection #{id}", admin.0.id);
    let events = stream::unfold(receiver, |mut receiver| async move {
        let message = receiver.recv().await?;
        let data = match serde_json::to_string(&message) {
            Ok(json) => format!("data: {json}\n\n"),
            Err(e) => {
                warn!("💻️📬️ Could not serialize hub broadcast. {e}");
                String::from(":\n\n")
            },
        };
        Some((Ok::<_, ServerError>(Bytes::from(data)), receiver))
    });
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events))
}
