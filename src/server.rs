//! Server module for managing HTTP server lifecycle
//!
//! This module builds the demo router, wraps it in the middleware pipeline
//! and runs it until a shutdown signal arrives.

use axum::{Json, Router, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Settings;
use crate::context::RequestContext;
use crate::middleware::{PipelineConfig, install_panic_hook, pipeline};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
}

/// Echo of the context the pipeline resolved for a request
#[derive(Debug, Serialize)]
struct WhoAmIResponse {
    request_id: Option<String>,
    tenant_id: Option<String>,
    tenant_slug: Option<String>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::pkg_version().to_string(),
    })
}

async fn whoami(ctx: RequestContext) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        request_id: ctx.request_id().map(String::from),
        tenant_id: ctx.tenant_id().map(String::from),
        tenant_slug: ctx.tenant_slug().map(String::from),
    })
}

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Demo routes wrapped in the full middleware pipeline.
    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/health", get(health))
            .route("/whoami", get(whoami))
            .route("/tenants/{tenant}/whoami", get(whoami));

        let mut config = PipelineConfig::new(self.settings.cors.clone());
        if let Some(tenant) = self.settings.tenant.to_tenant_config() {
            config = config.with_tenant(tenant);
        }

        pipeline::apply(routes, config)
    }

    /// Start the server and run until shutdown signal
    ///
    /// # Errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            "Server configuration loaded"
        );

        tracing::info!(
            allowed_origins = ?self.settings.cors.allowed_origins,
            allow_credentials = self.settings.cors.allow_credentials,
            max_age = self.settings.cors.max_age,
            "CORS configuration loaded"
        );
        if self.settings.cors.credentials_with_wildcard() {
            tracing::warn!(
                "cors.allow_credentials is enabled with a wildcard origin; every origin will be echoed with credentials"
            );
        }

        tracing::info!(
            resolver = self.settings.tenant.resolver,
            url_param_name = %self.settings.tenant.url_param_name,
            required = self.settings.tenant.required,
            "Tenant configuration loaded"
        );

        install_panic_hook();
        let router = self.router();

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{CorsConfig, REQUEST_ID_HEADER};
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    async fn get_json(
        router: Router,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let router = Server::new(Settings::default()).router();
        let (status, body) = get_json(router, "/health", &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_whoami_with_header_only_stage() {
        let router = Server::new(Settings::default()).router();
        let (_, body) = get_json(
            router,
            "/tenants/acme/whoami",
            &[
                ("X-Request-ID", "abc"),
                ("X-Tenant-ID", "T5"),
                ("X-Tenant-Slug", "globex"),
            ],
        )
        .await;

        assert_eq!(body["request_id"], "abc");
        assert_eq!(body["tenant_id"], "T5");
        assert_eq!(body["tenant_slug"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_whoami_with_resolver_reads_path() {
        let mut settings = Settings::default();
        settings.tenant.resolver = true;
        settings.cors = CorsConfig::with_origins(["https://a.com"]);

        let router = Server::new(settings).router();
        let (_, body) = get_json(router, "/tenants/acme/whoami", &[]).await;

        assert_eq!(body["tenant_slug"], "acme");
        assert!(body["request_id"].as_str().is_some_and(|id| id.len() == 36));
    }

    #[tokio::test]
    async fn test_required_tenant_rejects_demo_route() {
        let mut settings = Settings::default();
        settings.tenant.resolver = true;
        settings.tenant.required = true;

        let router = Server::new(settings).router();
        let (status, body) = get_json(router, "/whoami", &[]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "tenant context required");
    }
}
