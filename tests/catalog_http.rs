use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use locallib_kernel::settings::Settings;

async fn app(seed: bool) -> Router {
    let mut settings = Settings::default();
    settings.database.seed_demo_data = seed;
    let app = locallib_app::bootstrap(&settings).await.unwrap();
    locallib_http::build_router(&app.registry, &settings)
}

async fn body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_redirects_to_catalog() {
    let response = app(false).await.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/catalog");
}

#[tokio::test]
async fn home_page_counts_seeded_catalog() {
    let response = app(true).await.oneshot(get("/catalog")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let page = body(response).await;
    assert_eq!(page["view"], "index");
    assert_eq!(page["model"]["data"]["book_count"], 7);
    assert_eq!(page["model"]["data"]["author_count"], 5);
    assert_eq!(page["model"]["data"]["genre_count"], 3);
    assert_eq!(page["model"]["data"]["book_instance_count"], 11);
    assert_eq!(page["model"]["data"]["book_instance_available_count"], 8);
}

#[tokio::test]
async fn created_genre_is_reachable_at_its_url() {
    let app = app(false).await;

    let created = app
        .clone()
        .oneshot(post("/catalog/genre/create", "name=Fantasy"))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    let location = created.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();

    let detail = app.clone().oneshot(get(&location)).await.unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let page = body(detail).await;
    assert_eq!(page["view"], "genre_detail");
    assert_eq!(page["model"]["genre"]["name"], "Fantasy");
    assert_eq!(page["model"]["genre"]["url"], location);

    let list = body(app.oneshot(get("/catalog/genres")).await.unwrap()).await;
    assert_eq!(list["model"]["genre_list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn author_with_books_cannot_be_deleted() {
    let app = app(true).await;

    let authors = body(app.clone().oneshot(get("/catalog/authors")).await.unwrap()).await;
    let bova = authors["model"]["author_list"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["family_name"] == "Bova")
        .unwrap()
        .clone();
    let id = bova["_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post(
            &format!("/catalog/author/{id}/delete"),
            &format!("authorid={id}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body(response).await;
    assert_eq!(page["view"], "author_delete");
    assert_eq!(page["model"]["author_books"].as_array().unwrap().len(), 2);

    let still_there = app.oneshot(get(&format!("/catalog/author/{id}"))).await.unwrap();
    assert_eq!(still_there.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let response = app(false)
        .await
        .oneshot(get("/catalog/book/0190a8a4-4f5e-7000-8000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(response).await["error"]["message"], "Book not found");
}

#[tokio::test]
async fn openapi_document_lists_catalog_paths() {
    let response = app(false)
        .await
        .oneshot(get("/docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spec = body(response).await;
    assert!(spec["paths"]["/catalog/books"]["get"].is_object());
    assert!(spec["paths"]["/healthz"]["get"].is_object());
    assert!(spec["components"]["schemas"]["Author"].is_object());
}
