//! Access logging middleware.
//!
//! Emits one structured record per request once the rest of the chain has
//! produced a response, correlated by the request's trace id and tenant.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use tracing::info;

use crate::context::RequestContext;

/// Middleware that logs one access record per request.
///
/// # Logged Information
/// - method, path, status, duration_ms
/// - request_id (`"unknown"` when the request id stage did not run)
/// - tenant_id and tenant_slug, only when resolved
///
/// The status is whatever the inner chain answered; handlers that do not
/// set one answer 200. A panic in the inner chain is logged with status 500,
/// the response the recovery stage sends, and then resumed so that the
/// recovery stage still handles it.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let record = AccessRecord {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        context: RequestContext::from_extensions(request.extensions()),
        start: Instant::now(),
    };

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            record.emit(response.status());
            response
        }
        Err(payload) => {
            record.emit(StatusCode::INTERNAL_SERVER_ERROR);
            panic::resume_unwind(payload)
        }
    }
}

/// Pending access log entry for one request.
struct AccessRecord {
    method: Method,
    path: String,
    context: RequestContext,
    start: Instant,
}

impl AccessRecord {
    fn emit(self, status: StatusCode) {
        let duration = self.start.elapsed();
        info!(
            method = %self.method,
            path = %self.path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            request_id = self.context.request_id().unwrap_or("unknown"),
            tenant_id = self.context.tenant_id(),
            tenant_slug = self.context.tenant_slug(),
            "http request"
        );
    }
}
