use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, CACHE_CONTROL},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::api::AppState;
use crate::models::Identity;
use crate::router::Route;
use crate::services::auth_service::{AuthClient, SESSION_COOKIE};
use crate::views::guard::SessionGuard;

/// Resolves the session cookie to the browser's `AuthClient` and stores it in
/// the request extensions. Requests without a live session pass through
/// untouched; the views decide whether that means a redirect.
pub struct SessionLoader;

impl<S, B> Transform<S, ServiceRequest> for SessionLoader
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionLoaderService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionLoaderService { service }))
    }
}

pub struct SessionLoaderService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for SessionLoaderService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = match (req.cookie(SESSION_COOKIE), req.app_data::<web::Data<AppState>>()) {
            (Some(cookie), Some(state)) => state.sessions.resolve(cookie.value()),
            _ => None,
        };

        let protected = Route::parse(req.path()).map_or(false, |route| route.requires_session());
        if let Some(client) = client {
            req.extensions_mut().insert(client);
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            // protected pages carry per-user data
            if protected {
                res.headers_mut()
                    .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }
            Ok(res)
        })
    }
}

/// The browser's session, if the cookie resolved to one.
#[derive(Clone, Default)]
pub struct Session(Option<Arc<AuthClient>>);

impl Session {
    pub fn client(&self) -> Option<&Arc<AuthClient>> {
        self.0.as_ref()
    }

    /// Signed-in identity for pages that render either way.
    pub fn identity(&self) -> Option<Identity> {
        SessionGuard::check(self.0.as_deref()).identity()
    }
}

impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Session(req.extensions().get::<Arc<AuthClient>>().cloned())))
    }
}
