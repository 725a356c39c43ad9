//! Request logging middleware.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

fn log_completion(method: &str, path: &str, status: StatusCode, duration_ms: u128) {
    let status_code = status.as_u16();
    if status.is_server_error() {
        warn!(target: "api", method, path, status = status_code, duration_ms, "Server error");
    } else if status.is_client_error() {
        info!(target: "api", method, path, status = status_code, duration_ms, "Client error");
    } else {
        info!(target: "api", method, path, status = status_code, duration_ms, "Request completed");
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
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
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        debug!(
            target: "api",
            method = %method,
            path = %path,
            query = %req.query_string(),
            remote_addr = req.connection_info().realip_remote_addr().unwrap_or("unknown"),
            "Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            log_completion(&method, &path, res.status(), start.elapsed().as_millis());
            Ok(res)
        })
    }
}
