//! Request ID middleware for request tracing.
//!
//! This middleware ensures every request has a trace identifier for
//! correlation across services. It either uses an existing X-Request-ID
//! header or generates a new UUID.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::context;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that ensures every request has a trace identifier.
///
/// # Behavior
/// - A non-empty X-Request-ID header is propagated verbatim, including
///   bytes outside ASCII; the context holds its lossy UTF-8 rendering
/// - A missing or empty header is replaced by a new UUID v4
/// - The value is stored in the [`RequestContext`](crate::RequestContext)
///   before the next stage runs
/// - The same value is set on the response headers
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
        .cloned();

    let (request_id, header) = match incoming {
        Some(value) => (
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
            Some(value),
        ),
        None => {
            let generated = Uuid::new_v4().to_string();
            let header = HeaderValue::from_str(&generated).ok();
            (generated, header)
        }
    };

    context::extend(request.extensions_mut(), |ctx| ctx.with_request_id(&request_id));

    let mut response = next.run(request).await;

    if let Some(value) = header {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}
