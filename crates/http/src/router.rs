//! Router builder for the catalog HTTP server

use axum::{response::Redirect, routing::get, Router};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use locallib_kernel::ModuleRegistry;

use crate::MakeRequestUuid;

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let path = format!("/{}", module_name);
        self.router = self.router.nest(&path, module_router);
        self
    }

    /// Send `/` to the given landing path
    pub fn redirect_root(mut self, target: &str) -> Self {
        let target = target.to_string();
        self.router = self.router.route(
            "/",
            get(move || {
                let target = target.clone();
                async move { Redirect::to(&target) }
            }),
        );
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Add OpenAPI documentation by collecting specs from all modules
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry);

        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "merged OpenAPI document is invalid; serving a stub");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("Local Library API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            });

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        // Also serve the raw JSON spec for external consumers
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every module's OpenAPI fragment into one document
pub fn merged_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Local Library API",
            "version": "1.0.0",
            "description": "Library catalog: books, authors, genres and copies"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "object",
                "properties": {
                    "code": { "type": "string" },
                    "message": { "type": "string" },
                    "details": { "type": "array", "items": {} },
                    "trace_id": { "type": "string" },
                    "timestamp": { "type": "string" }
                },
                "required": ["code", "message", "trace_id", "timestamp"]
            }
        },
        "required": ["error"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": { "text/plain": { "schema": { "type": "string" } } }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let prefixed_path = match path.as_str() {
                    "/" => format!("/{}", module.name()),
                    _ => format!("/{}{}", module.name(), path),
                };
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::sync::Arc;
    use locallib_kernel::Module;
    use tower::ServiceExt;

    struct ShelfModule;

    #[async_trait::async_trait]
    impl locallib_kernel::Module for ShelfModule {
        fn name(&self) -> &'static str {
            "shelves"
        }

        fn routes(&self) -> Router {
            Router::new().route("/all", get(|| async { "shelves" }))
        }

        fn openapi(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!({
                "paths": { "/all": { "get": { "responses": {} } } },
                "components": { "schemas": { "Shelf": { "type": "object" } } }
            }))
        }
    }

    #[tokio::test]
    async fn mounted_module_answers_under_its_name() {
        let router = RouterBuilder::new()
            .mount_module("shelves", ShelfModule.routes())
            .build();

        let response = router
            .oneshot(Request::get("/shelves/all").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_redirects_to_landing_page() {
        let router = RouterBuilder::new().redirect_root("/shelves").build();

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/shelves");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let router = RouterBuilder::new()
            .route("/health", get(|| async { "ok" }))
            .with_tracing()
            .with_cors()
            .with_request_id()
            .with_timeout(5000)
            .build();

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn module_fragments_are_merged() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(ShelfModule));

        let spec = merged_openapi(&registry);
        assert!(spec["paths"]["/shelves/all"].is_object());
        assert!(spec["paths"]["/healthz"].is_object());
        assert!(spec["components"]["schemas"]["Shelf"].is_object());
        assert!(spec["components"]["schemas"]["ErrorResponse"].is_object());
    }
}
