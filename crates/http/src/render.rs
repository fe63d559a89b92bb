//! Presentation gateway: turns a named view and its model into a response.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Renders a named view with its view model.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &str, model: Value) -> Response;
}

/// Renderer emitting `{"view": <name>, "model": <model>}` as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, view: &str, model: Value) -> Response {
        Json(json!({ "view": view, "model": model })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn json_renderer_wraps_view_and_model() {
        let response = JsonRenderer.render("genre_list", json!({"title": "Genre List"}));
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["view"], "genre_list");
        assert_eq!(body["model"]["title"], "Genre List");
    }
}
