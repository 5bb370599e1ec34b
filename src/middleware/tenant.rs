//! Tenant resolution middleware.
//!
//! Two variants are provided:
//! - [`tenant_middleware`]: reads `X-Tenant-ID` only, never rejects.
//! - [`tenant_resolver_middleware`]: resolves tenant id and slug from a
//!   chain of sources configured through [`TenantConfig`].
//!
//! Resolution order for the chained variant:
//! 1. Claims from the authentication layer ([`ClaimsExtractor`])
//! 2. `X-Tenant-ID` / `X-Tenant-Slug` headers
//! 3. A URL path parameter ([`UrlParamSource`]), classified as an id when it
//!    parses as a UUID and as a slug otherwise
//!
//! Each source only fills fields left unresolved by the sources before it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{Extensions, HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::context::{self, RequestContext};
use crate::error::{HttpwareError, HttpwareResult};

/// Header carrying the tenant id.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Header carrying the tenant slug.
pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";

/// Path parameter consulted when none is configured.
pub const DEFAULT_URL_PARAM_NAME: &str = "tenant";

/// Tenant identity asserted by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantClaims {
    pub tenant_id: String,
    pub tenant_slug: String,
}

impl TenantClaims {
    pub fn new(tenant_id: impl Into<String>, tenant_slug: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            tenant_slug: tenant_slug.into(),
        }
    }
}

/// Reads tenant claims placed on the request by an upstream auth layer.
///
/// Returning `Some` is authoritative for both fields, even when one of them
/// is empty. Any `Fn(&Extensions) -> Option<TenantClaims>` qualifies.
pub trait ClaimsExtractor: Send + Sync {
    fn extract(&self, extensions: &Extensions) -> Option<TenantClaims>;
}

impl<F> ClaimsExtractor for F
where
    F: Fn(&Extensions) -> Option<TenantClaims> + Send + Sync,
{
    fn extract(&self, extensions: &Extensions) -> Option<TenantClaims> {
        self(extensions)
    }
}

/// Looks up a named URL path parameter.
#[async_trait]
pub trait UrlParamSource: Send + Sync {
    async fn url_param(&self, parts: &mut Parts, name: &str) -> Option<String>;
}

/// [`UrlParamSource`] backed by the axum router's matched path parameters.
///
/// Parameters are only visible to middleware that runs after routing, i.e.
/// layers added with `Router::layer` or `Router::route_layer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutePathParams;

#[async_trait]
impl UrlParamSource for RoutePathParams {
    async fn url_param(&self, parts: &mut Parts, name: &str) -> Option<String> {
        let params = RawPathParams::from_request_parts(parts, &()).await.ok()?;
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

/// Configuration for [`tenant_resolver_middleware`].
///
/// Sources left as `None` are disabled.
#[derive(Clone)]
pub struct TenantConfig {
    pub claims_extractor: Option<Arc<dyn ClaimsExtractor>>,
    pub url_param: Option<Arc<dyn UrlParamSource>>,
    pub url_param_name: String,
    /// Reject requests with 400 when neither id nor slug resolves.
    pub required: bool,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            claims_extractor: None,
            url_param: None,
            url_param_name: DEFAULT_URL_PARAM_NAME.to_string(),
            required: false,
        }
    }
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("claims_extractor", &self.claims_extractor.is_some())
            .field("url_param", &self.url_param.is_some())
            .field("url_param_name", &self.url_param_name)
            .field("required", &self.required)
            .finish()
    }
}

impl TenantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claims_extractor(mut self, extractor: impl ClaimsExtractor + 'static) -> Self {
        self.claims_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_url_param(mut self, source: impl UrlParamSource + 'static) -> Self {
        self.url_param = Some(Arc::new(source));
        self
    }

    /// An empty name falls back to [`DEFAULT_URL_PARAM_NAME`].
    pub fn with_url_param_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.url_param_name = if name.is_empty() {
            DEFAULT_URL_PARAM_NAME.to_string()
        } else {
            name
        };
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Runs every configured source against the request.
    ///
    /// The URL parameter source is only consulted when it could still fill
    /// a field.
    pub async fn resolve(&self, parts: &mut Parts) -> ResolvedTenant {
        let claims = self
            .claims_extractor
            .as_ref()
            .and_then(|extractor| extractor.extract(&parts.extensions));

        let header_id = header_value(&parts.headers, TENANT_ID_HEADER);
        let header_slug = header_value(&parts.headers, TENANT_SLUG_HEADER);

        let url_param = match &self.url_param {
            Some(source) if claims.is_none() || header_id.is_none() || header_slug.is_none() => {
                source.url_param(parts, &self.url_param_name).await
            }
            _ => None,
        };

        resolve_sources(
            claims,
            header_id.as_deref(),
            header_slug.as_deref(),
            url_param.as_deref(),
        )
    }

    /// Applies the `required` rule to a resolution result.
    pub fn enforce(&self, resolved: ResolvedTenant) -> HttpwareResult<ResolvedTenant> {
        if self.required && resolved.is_empty() {
            return Err(HttpwareError::TenantRequired);
        }
        Ok(resolved)
    }
}

/// Outcome of tenant resolution. Stored values are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub tenant_id: Option<String>,
    pub tenant_slug: Option<String>,
}

impl ResolvedTenant {
    pub fn is_empty(&self) -> bool {
        self.tenant_id.is_none() && self.tenant_slug.is_none()
    }

    /// Binds the resolved fields into `ctx`.
    pub fn apply(&self, ctx: &RequestContext) -> RequestContext {
        let mut next = ctx.clone();
        if let Some(id) = &self.tenant_id {
            next = next.with_tenant_id(id);
        }
        if let Some(slug) = &self.tenant_slug {
            next = next.with_tenant_slug(slug);
        }
        next
    }
}

/// Non-empty header value; bytes outside UTF-8 are replaced, not dropped.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .filter(|v| !v.is_empty())
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Combines the three tenant sources by precedence.
///
/// A field counts as resolved once a source has claimed it; successful
/// claims resolve both fields, possibly to empty.
pub fn resolve_sources(
    claims: Option<TenantClaims>,
    header_id: Option<&str>,
    header_slug: Option<&str>,
    url_param: Option<&str>,
) -> ResolvedTenant {
    let (mut tenant_id, mut tenant_slug) = match claims {
        Some(claims) => (Some(claims.tenant_id), Some(claims.tenant_slug)),
        None => (None, None),
    };

    if tenant_id.is_none() {
        tenant_id = header_id.filter(|v| !v.is_empty()).map(String::from);
    }
    if tenant_slug.is_none() {
        tenant_slug = header_slug.filter(|v| !v.is_empty()).map(String::from);
    }

    if let Some(param) = url_param.filter(|v| !v.is_empty()) {
        if Uuid::parse_str(param).is_ok() {
            if tenant_id.is_none() {
                tenant_id = Some(param.to_string());
            }
        } else if tenant_slug.is_none() {
            tenant_slug = Some(param.to_string());
        }
    }

    ResolvedTenant {
        tenant_id: tenant_id.and_then(non_empty),
        tenant_slug: tenant_slug.and_then(non_empty),
    }
}

/// Header-only tenant middleware.
///
/// A non-empty `X-Tenant-ID` header is stored in the request context;
/// otherwise the request continues without tenant context.
pub async fn tenant_middleware(mut request: Request, next: Next) -> Response {
    if let Some(tenant_id) = header_value(request.headers(), TENANT_ID_HEADER) {
        context::extend(request.extensions_mut(), |ctx| ctx.with_tenant_id(&tenant_id));
    }

    next.run(request).await
}

/// Chained tenant resolution middleware.
///
/// # Errors
/// Returns [`HttpwareError::TenantRequired`] (400) when `required` is set
/// and no source produced a tenant id or slug. The next stage is not run.
///
/// # Example
/// ```ignore
/// let config = Arc::new(TenantConfig::new().with_url_param(RoutePathParams).required(true));
/// Router::new()
///     .route("/tenants/{tenant}/orders", get(handler))
///     .layer(middleware::from_fn_with_state(config, tenant_resolver_middleware))
/// ```
pub async fn tenant_resolver_middleware(
    State(config): State<Arc<TenantConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, HttpwareError> {
    let (mut parts, body) = request.into_parts();

    let resolved = config.resolve(&mut parts).await;
    let resolved = config.enforce(resolved).inspect_err(|_| {
        tracing::debug!(
            method = %parts.method,
            path = %parts.uri.path(),
            "Rejecting request without tenant context"
        );
    })?;

    context::extend(&mut parts.extensions, |ctx| resolved.apply(ctx));

    Ok(next.run(Request::from_parts(parts, body)).await)
}
