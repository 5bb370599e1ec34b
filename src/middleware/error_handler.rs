//! Error handler for converting HttpwareError to HTTP responses.
//!
//! The bodies are fixed so that shared clients can match on them: the
//! tenant rejection is a one-field JSON object, the recovery fallback is
//! plain text and never carries the original panic detail.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::HttpwareError;

/// Plain-text body sent for recovered panics.
pub const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

impl IntoResponse for HttpwareError {
    /// # Status Code Mapping
    /// - TenantRequired → 400 BAD_REQUEST, `{"error":"tenant context required"}`
    /// - Internal → 500 INTERNAL_SERVER_ERROR, `Internal Server Error`
    fn into_response(self) -> Response {
        match self {
            HttpwareError::TenantRequired => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            HttpwareError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                INTERNAL_SERVER_ERROR_BODY,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_tenant_required_response() {
        let response = HttpwareError::TenantRequired.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"tenant context required"}"#);
    }

    #[tokio::test]
    async fn test_internal_response_hides_detail() {
        let response = HttpwareError::internal("secret detail").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], INTERNAL_SERVER_ERROR_BODY.as_bytes());
    }
}
