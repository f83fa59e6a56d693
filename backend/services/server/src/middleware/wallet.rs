use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::StatusCode,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

pub const WALLET_HEADER: &str = "x-wallet-address";

/// Public key of the caller, set by `WalletMiddleware`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddress(pub String);

pub(crate) fn reject(status: StatusCode, message: &'static str) -> Error {
    let response = HttpResponse::build(status).json(json!({
        "status": "error",
        "message": message
    }));
    InternalError::from_response(message, response).into()
}

pub struct WalletMiddleware;

impl<S, B> Transform<S, ServiceRequest> for WalletMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = WalletMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WalletMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct WalletMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WalletMiddlewareService<S>
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
        let address = match req.headers().get(WALLET_HEADER).map(|h| h.to_str()) {
            Some(Ok(value)) if !value.trim().is_empty() => value.trim().to_string(),
            Some(_) => {
                return Box::pin(async {
                    Err(reject(StatusCode::UNAUTHORIZED, "Invalid wallet address header"))
                });
            }
            None => {
                return Box::pin(async {
                    Err(reject(StatusCode::UNAUTHORIZED, "Missing wallet address header"))
                });
            }
        };

        req.extensions_mut().insert(WalletAddress(address));

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
