//! Request-scoped context shared by the middleware stages.
//!
//! Every stage that learns something about the request (trace id, tenant,
//! user) records it in a [`RequestContext`] stored in the request's
//! extensions. The context is never mutated in place: each `with_*` call
//! returns a new value, and stages re-insert the extended copy before
//! delegating. Because the context is keyed by its own Rust type, it cannot
//! collide with extensions inserted by the host service.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::Extensions;
use axum::http::request::Parts;

/// Well-known context keys.
///
/// The string form is used as the field name in structured log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    RequestId,
    TenantId,
    TenantSlug,
    UserId,
}

impl ContextKey {
    pub const ALL: [ContextKey; 4] = [
        ContextKey::RequestId,
        ContextKey::TenantId,
        ContextKey::TenantSlug,
        ContextKey::UserId,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ContextKey::RequestId => "request_id",
            ContextKey::TenantId => "tenant_id",
            ContextKey::TenantSlug => "tenant_slug",
            ContextKey::UserId => "user_id",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-request key/value store.
///
/// Cloning is cheap; values are reference counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Option<Arc<str>>,
    tenant_id: Option<Arc<str>>,
    tenant_slug: Option<Arc<str>>,
    user_id: Option<Arc<str>>,
}

/// An empty string is never stored; it reads back as absent.
fn bind(value: &str) -> Option<Arc<str>> {
    (!value.is_empty()).then(|| Arc::from(value))
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context attached to `extensions`, or an empty one.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Self>().cloned().unwrap_or_default()
    }

    fn slot(&self, key: ContextKey) -> &Option<Arc<str>> {
        match key {
            ContextKey::RequestId => &self.request_id,
            ContextKey::TenantId => &self.tenant_id,
            ContextKey::TenantSlug => &self.tenant_slug,
            ContextKey::UserId => &self.user_id,
        }
    }

    pub fn get(&self, key: ContextKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Returns a copy of this context with `key` bound to `value`.
    pub fn with(&self, key: ContextKey, value: impl AsRef<str>) -> Self {
        let mut next = self.clone();
        let bound = bind(value.as_ref());
        match key {
            ContextKey::RequestId => next.request_id = bound,
            ContextKey::TenantId => next.tenant_id = bound,
            ContextKey::TenantSlug => next.tenant_slug = bound,
            ContextKey::UserId => next.user_id = bound,
        }
        next
    }

    pub fn request_id(&self) -> Option<&str> {
        self.get(ContextKey::RequestId)
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.get(ContextKey::TenantId)
    }

    pub fn tenant_slug(&self) -> Option<&str> {
        self.get(ContextKey::TenantSlug)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(ContextKey::UserId)
    }

    pub fn with_request_id(&self, request_id: impl AsRef<str>) -> Self {
        self.with(ContextKey::RequestId, request_id)
    }

    pub fn with_tenant_id(&self, tenant_id: impl AsRef<str>) -> Self {
        self.with(ContextKey::TenantId, tenant_id)
    }

    pub fn with_tenant_slug(&self, tenant_slug: impl AsRef<str>) -> Self {
        self.with(ContextKey::TenantSlug, tenant_slug)
    }

    pub fn with_user_id(&self, user_id: impl AsRef<str>) -> Self {
        self.with(ContextKey::UserId, user_id)
    }
}

/// Replaces the context in `extensions` with `f(current)`.
pub(crate) fn extend(extensions: &mut Extensions, f: impl FnOnce(&RequestContext) -> RequestContext) {
    let next = f(&RequestContext::from_extensions(extensions));
    extensions.insert(next);
}

/// Trace id attached to the request, if any.
pub fn get_request_id(extensions: &Extensions) -> Option<&str> {
    extensions.get::<RequestContext>()?.request_id()
}

pub fn get_tenant_id(extensions: &Extensions) -> Option<&str> {
    extensions.get::<RequestContext>()?.tenant_id()
}

pub fn get_tenant_slug(extensions: &Extensions) -> Option<&str> {
    extensions.get::<RequestContext>()?.tenant_slug()
}

pub fn get_user_id(extensions: &Extensions) -> Option<&str> {
    extensions.get::<RequestContext>()?.user_id()
}

/// Handlers can take `RequestContext` directly as an argument.
///
/// Never rejects: a request that bypassed the middleware yields an empty
/// context.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}
