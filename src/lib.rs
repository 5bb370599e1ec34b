//! httpware
//!
//! Shared HTTP middleware for multi-tenant axum services: request
//! identifiers, tenant resolution, panic recovery, access logging and CORS,
//! all sharing one request-scoped [`RequestContext`].

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod server;

#[cfg(test)]
mod test_support;

pub use context::{ContextKey, RequestContext};
pub use error::{HttpwareError, HttpwareResult};

pub fn pkg_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
