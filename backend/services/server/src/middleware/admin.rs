use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use log::warn;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::config::ServerConfig;
use crate::middleware::wallet::{reject, WalletAddress};

/// Lets through wallets listed in `ADMIN_ADDRESSES`. Must run after `WalletMiddleware`.
pub struct AdminMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let wallet = match req.extensions().get::<WalletAddress>() {
            Some(wallet) => wallet.clone(),
            None => {
                return Box::pin(async {
                    Err(reject(StatusCode::UNAUTHORIZED, "Authentication required"))
                });
            }
        };

        let is_admin = req
            .app_data::<web::Data<ServerConfig>>()
            .map(|config| config.is_admin(&wallet.0))
            .unwrap_or(false);
        if !is_admin {
            warn!("Rejected admin request from {}", wallet.0);
            return Box::pin(async { Err(reject(StatusCode::FORBIDDEN, "Admin access required")) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
