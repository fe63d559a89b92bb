//! HTTP server facade with Axum, error handling, rendering, and OpenAPI support.

use anyhow::Context;
use axum::{extract::Request, http::HeaderValue, routing::get, Router};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

use locallib_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod render;
pub mod router;

pub use error::AppError;
pub use render::{JsonRenderer, Renderer};
use router::RouterBuilder;

/// Path `/` redirects to
pub const LANDING_PATH: &str = "/catalog";

/// Start the HTTP server with the given module registry, serving until
/// `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_router(registry, settings);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new()
        .route("/healthz", get(health_check))
        .redirect_root(LANDING_PATH);

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    router_builder
        .with_openapi(registry)
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Request ID generator for tracing
#[derive(Clone)]
pub(crate) struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_and_docs_are_served() {
        let registry = ModuleRegistry::new();
        let router = build_router(&registry, &Settings::default());

        let health = router
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let docs = router
            .oneshot(Request::get("/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(docs.status(), StatusCode::OK);
    }
}
