//! CORS policy for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Server-to-server calls are not
//!   restricted by it, so a disallowed origin only means the headers are
//!   left off; the request itself still runs.
//! - Preflight (`OPTIONS`) requests are always answered here with 204 and
//!   never reach the handler.
//!
//! The allowed origin is echoed back verbatim rather than as `*`, which
//! keeps the response valid when credentials are allowed.
//!
//! Headers are decided before the handler runs and registered with the
//! recovery stage, so a panicking handler's 500 still carries them.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::RecoveryHeaders;

/// Origin entry matching every origin.
pub const WILDCARD_ORIGIN: &str = "*";

fn default_allowed_origins() -> Vec<String> {
    vec![WILDCARD_ORIGIN.to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_allowed_headers() -> Vec<String> {
    [
        "Content-Type",
        "Authorization",
        "X-Request-ID",
        "X-Tenant-ID",
        "X-Tenant-Slug",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_allow_credentials() -> bool {
    true
}

fn default_max_age() -> u64 {
    86400
}

/// Cross-origin policy, shared read-only by every request.
///
/// The default is the permissive development policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins, or `"*"` for any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Sent in order, joined with `", "`
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Sent in order, joined with `", "`
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,

    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds; 0 omits the header
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            allow_credentials: default_allow_credentials(),
            max_age: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Allow only the given origins, keeping the other defaults.
    pub fn with_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether any origin is echoed back together with credentials.
    pub fn credentials_with_wildcard(&self) -> bool {
        self.allow_credentials
            && self
                .allowed_origins
                .iter()
                .any(|allowed| allowed == WILDCARD_ORIGIN)
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == WILDCARD_ORIGIN || allowed == origin)
    }

    /// CORS response headers for an allowed `origin`.
    ///
    /// Entries that are not valid header values are skipped.
    fn response_headers(&self, origin: HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);

        if let Ok(methods) = HeaderValue::from_str(&self.allowed_methods.join(", ")) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);
        }
        if let Ok(allowed) = HeaderValue::from_str(&self.allowed_headers.join(", ")) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed);
        }
        if self.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if self.max_age > 0 {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age));
        }
        headers
    }
}

/// CORS middleware.
///
/// # Behavior
/// - Non-empty, allowed `Origin`: CORS headers are added to the response
/// - `OPTIONS`: answered with 204 and an empty body, handler not called
/// - Anything else is passed through unchanged
///
/// # Example
/// ```ignore
/// let cors = Arc::new(CorsConfig::with_origins(["https://app.example.com"]));
/// router.layer(middleware::from_fn_with_state(cors, cors_middleware))
/// ```
pub async fn cors_middleware(
    State(config): State<Arc<CorsConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let cors_headers = request
        .headers()
        .get(ORIGIN)
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            origin
                .to_str()
                .is_ok_and(|origin| config.allows_origin(origin))
        })
        .map(|origin| config.response_headers(origin.clone()));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        if let (Some(headers), Some(slot)) = (
            &cors_headers,
            request.extensions().get::<RecoveryHeaders>(),
        ) {
            slot.extend(headers);
        }
        next.run(request).await
    };

    if let Some(headers) = cors_headers {
        response.headers_mut().extend(headers);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware::from_fn_with_state, routing::any};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn app(config: CorsConfig, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/resource",
                any(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "resource"
                    }
                }),
            )
            .layer(from_fn_with_state(Arc::new(config), cors_middleware))
    }

    fn request(method: Method, origin: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder()
            .method(method)
            .uri("/resource");
        if let Some(origin) = origin {
            builder = builder.header(ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_default_config_is_permissive() {
        let config = CorsConfig::default();
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert_eq!(config.allowed_methods.len(), 6);
        assert!(config.allowed_headers.contains(&"X-Tenant-Slug".to_string()));
        assert!(config.allow_credentials);
        assert_eq!(config.max_age, 86400);
        assert!(config.allows_origin("https://anything.example"));
    }

    #[test]
    fn test_allows_origin_exact_match_only() {
        let config = CorsConfig::with_origins(["https://a.com"]);
        assert!(config.allows_origin("https://a.com"));
        assert!(!config.allows_origin("https://a.com.evil.com"));
        assert!(!config.allows_origin("http://a.com"));
    }

    #[test]
    fn test_credentials_with_wildcard() {
        assert!(CorsConfig::default().credentials_with_wildcard());
        assert!(!CorsConfig::with_origins(["https://a.com"]).credentials_with_wildcard());

        let anonymous = CorsConfig {
            allow_credentials: false,
            ..CorsConfig::default()
        };
        assert!(!anonymous.credentials_with_wildcard());
    }

    #[tokio::test]
    async fn test_allowed_origin_gets_headers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let config = CorsConfig {
            allowed_origins: vec!["https://a.com".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "X-Tenant-ID".to_string()],
            allow_credentials: true,
            max_age: 600,
        };

        let response = app(config, hits.clone())
            .oneshot(request(Method::GET, Some("https://a.com")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, X-Tenant-ID");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "600");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wildcard_echoes_request_origin() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(CorsConfig::default(), hits)
            .oneshot(request(Method::GET, Some("https://b.com")))
            .await
            .unwrap();

        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://b.com");
    }

    #[tokio::test]
    async fn test_optional_headers_omitted() {
        let hits = Arc::new(AtomicUsize::new(0));
        let config = CorsConfig {
            allow_credentials: false,
            max_age: 0,
            ..CorsConfig::default()
        };

        let response = app(config, hits)
            .oneshot(request(Method::GET, Some("https://a.com")))
            .await
            .unwrap();

        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_CREDENTIALS));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_MAX_AGE));
    }

    #[tokio::test]
    async fn test_disallowed_origin_gets_no_headers_but_reaches_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(CorsConfig::with_origins(["https://a.com"]), hits.clone())
            .oneshot(request(Method::POST, Some("https://evil.com")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_METHODS));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_origin_sets_no_headers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(CorsConfig::default(), hits)
            .oneshot(request(Method::GET, None))
            .await
            .unwrap();

        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(CorsConfig::with_origins(["https://a.com"]), hits.clone())
            .oneshot(request(Method::OPTIONS, Some("https://a.com")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preflight_from_disallowed_origin_still_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let response = app(CorsConfig::with_origins(["https://a.com"]), hits.clone())
            .oneshot(request(Method::OPTIONS, Some("https://evil.com")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
