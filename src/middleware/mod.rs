//! Middleware components for request processing.
//!
//! This module contains the request id, tenant resolution, panic recovery,
//! access logging and CORS stages, plus [`pipeline::apply`] which layers
//! them in their canonical order.

mod cors;
mod error_handler;
mod logging;
pub mod pipeline;
mod recover;
mod request_id;
mod tenant;

pub use cors::{CorsConfig, WILDCARD_ORIGIN, cors_middleware};
pub use error_handler::INTERNAL_SERVER_ERROR_BODY;
pub use logging::logging_middleware;
pub use pipeline::PipelineConfig;
pub use recover::{RecoveryHeaders, install_panic_hook, panic_message, recover_middleware};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use tenant::{
    ClaimsExtractor, DEFAULT_URL_PARAM_NAME, ResolvedTenant, RoutePathParams, TENANT_ID_HEADER,
    TENANT_SLUG_HEADER, TenantClaims, TenantConfig, UrlParamSource, resolve_sources,
    tenant_middleware, tenant_resolver_middleware,
};
