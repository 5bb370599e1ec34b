//! Canonical assembly of the middleware stages.

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};

use super::{
    CorsConfig, TenantConfig, cors_middleware, logging_middleware, recover_middleware,
    request_id_middleware, tenant_middleware, tenant_resolver_middleware,
};

/// Shared configuration for [`apply`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub cors: Arc<CorsConfig>,
    /// `None` selects the header-only tenant stage.
    pub tenant: Option<Arc<TenantConfig>>,
}

impl PipelineConfig {
    pub fn new(cors: CorsConfig) -> Self {
        Self {
            cors: Arc::new(cors),
            tenant: None,
        }
    }

    pub fn with_tenant(mut self, tenant: TenantConfig) -> Self {
        self.tenant = Some(Arc::new(tenant));
        self
    }
}

/// Layers every stage onto `router`.
///
/// # Middleware Order
/// Layers are applied in reverse order of declaration (last added runs
/// first), so requests pass through:
/// 1. Request ID: assigns the trace id every later stage logs
/// 2. Tenant: resolves tenant context, may reject with 400
/// 3. Recover: fault boundary for everything below
/// 4. Logging: one access record per request
/// 5. CORS: response headers, answers preflight
/// 6. The router's handlers
///
/// Layers added with `Router::layer` run after routing, so URL path
/// parameters are visible to the tenant stage.
pub fn apply<S>(router: Router<S>, config: PipelineConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = router
        .layer(from_fn_with_state(config.cors, cors_middleware))
        .layer(from_fn(logging_middleware))
        .layer(from_fn(recover_middleware));

    let router = match config.tenant {
        Some(tenant) => router.layer(from_fn_with_state(tenant, tenant_resolver_middleware)),
        None => router.layer(from_fn(tenant_middleware)),
    };

    router.layer(from_fn(request_id_middleware))
}
