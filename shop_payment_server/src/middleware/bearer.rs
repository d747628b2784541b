//! Bearer token middleware for Actix Web.
//!
//! Every admin route is wrapped by this middleware. It reads the `Authorization: Bearer <token>` header, validates the
//! token with the [`AuthApi`] registered as app data, and stores the token's owner in the request extensions as an
//! [`AdminUser`]. Requests that fail validation never reach the handler.
use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use futures::future::LocalBoxFuture;
use log::*;
use shop_payment_engine::{db_types::User, AuthApi, AuthManagement};

use crate::errors::ServerError;

/// The admin user that the bearer token on the current request belongs to.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AdminUser>().cloned();
        ready(user.ok_or(ServerError::AuthenticationError))
    }
}

pub struct BearerAuthMiddlewareFactory<A> {
    _backend: PhantomData<fn() -> A>,
}

impl<A> BearerAuthMiddlewareFactory<A> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = BearerAuthMiddlewareService<S, A>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddlewareService { service: Rc::new(service), _backend: PhantomData }))
    }
}

pub struct BearerAuthMiddlewareService<S, A> {
    service: Rc<S>,
    _backend: PhantomData<fn() -> A>,
}

impl<S, B, A> Service<ServiceRequest> for BearerAuthMiddlewareService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let api = req.app_data::<web::Data<AuthApi<A>>>().cloned();
        let header = req.headers().get(AUTHORIZATION).map(|v| v.to_str().map(String::from));
        Box::pin(async move {
            trace!("🔐️ Checking bearer token for {}", req.path());
            let api = api.ok_or_else(|| {
                error!("🔐️ No AuthApi has been registered with the server. Denying access.");
                ServerError::InitializeError("Authentication is not configured".into())
            })?;
            let header = match header {
                None => None,
                Some(Ok(h)) => Some(h),
                Some(Err(e)) => {
                    debug!("🔐️ Authorization header is not valid text. {e}");
                    return Err(ServerError::AuthenticationError.into());
                },
            };
            let user = api.validate_request(header.as_deref()).await.map_err(ServerError::from)?;
            trace!("🔐️ Bearer token for user #{} ✅️", user.id);
            req.extensions_mut().insert(AdminUser(user));
            service.call(req).await
        })
    }
}
