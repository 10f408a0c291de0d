use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn, Level};

use crate::middleware::request_trace::TraceId;

/// One `request_completed` line per request, levelled by status class.
///
/// Carries the matched route pattern and, for session routes, the session id.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

struct Completed {
    method: String,
    path: String,
    trace_id: String,
    route: String,
    session_id: String,
    status: u16,
    duration_us: u64,
}

impl Completed {
    fn emit(&self, level: Level) {
        let Completed {
            method,
            path,
            trace_id,
            route,
            session_id,
            status,
            duration_us,
        } = self;

        if level == Level::ERROR {
            error!(http.method = %method, http.route = %route, url.path = %path, http.status_code = status, session_id = %session_id, duration_us, trace_id = %trace_id, "request_completed")
        } else if level == Level::WARN {
            warn!(http.method = %method, http.route = %route, url.path = %path, http.status_code = status, session_id = %session_id, duration_us, trace_id = %trace_id, "request_completed")
        } else {
            info!(http.method = %method, http.route = %route, url.path = %path, http.status_code = status, session_id = %session_id, duration_us, trace_id = %trace_id, "request_completed")
        }
    }
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|t| t.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            // Routing has run by now, so the response's request knows its pattern.
            let (status, route, session_id) = match &result {
                Ok(res) => (
                    res.status(),
                    res.request().match_pattern(),
                    res.request()
                        .match_info()
                        .get("session_id")
                        .map(str::to_owned),
                ),
                Err(err) => (err.as_response_error().status_code(), None, None),
            };

            let level = if status.is_server_error() {
                Level::ERROR
            } else if status.is_client_error() {
                Level::WARN
            } else {
                Level::INFO
            };

            Completed {
                method,
                path,
                trace_id,
                route: route.unwrap_or_else(|| "unmatched".to_string()),
                session_id: session_id.unwrap_or_default(),
                status: status.as_u16(),
                duration_us: start.elapsed().as_micros() as u64,
            }
            .emit(level);

            result
        })
    }
}
