//! HTTP boundary of the catalog: decode the request, run the workflow, map
//! the outcome to a response.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Request, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};

use locallib_http::{AppError, Renderer};

use super::forms::RawForm;
use super::workflow::{Catalog, CatalogError, Outcome, View};

type Page = Result<Response, AppError>;

/// Decoded `application/x-www-form-urlencoded` body, repeated keys kept.
/// A body that cannot be decoded is a 400 in the error envelope.
pub(crate) struct Fields(RawForm);

impl<S: Send + Sync> FromRequest<S> for Fields {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(RawForm::from_pairs(pairs)))
    }
}

#[derive(Clone)]
pub struct CatalogState {
    pub catalog: Catalog,
    pub renderer: Arc<dyn Renderer>,
}

impl CatalogState {
    pub fn new(catalog: Catalog, renderer: Arc<dyn Renderer>) -> Self {
        Self { catalog, renderer }
    }

    fn respond(&self, outcome: Result<Outcome, CatalogError>) -> Page {
        match outcome? {
            Outcome::Render(View { name, model }) => Ok(self.renderer.render(name, model)),
            Outcome::Redirect(location) => Ok(Redirect::to(&location).into_response()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(message) => AppError::not_found(message),
            CatalogError::Persistence(source) => {
                AppError::Internal(anyhow::Error::new(source).context("catalog storage failure"))
            }
        }
    }
}

/// Routes relative to the module mount point.
pub fn router(state: CatalogState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/books", get(book_list))
        .route("/book/create", get(book_create_form).post(book_create))
        .route("/book/{id}", get(book_detail))
        .route("/book/{id}/update", get(book_update_form).post(book_update))
        .route("/book/{id}/delete", get(book_delete_form).post(book_delete))
        .route("/bookinstances", get(bookinstance_list))
        .route(
            "/bookinstance/create",
            get(bookinstance_create_form).post(bookinstance_create),
        )
        .route("/bookinstance/{id}", get(bookinstance_detail))
        .route(
            "/bookinstance/{id}/update",
            get(bookinstance_update_form).post(bookinstance_update),
        )
        .route(
            "/bookinstance/{id}/delete",
            get(bookinstance_delete_form).post(bookinstance_delete),
        )
        .route("/authors", get(author_list))
        .route("/author/create", get(author_create_form).post(author_create))
        .route("/author/{id}", get(author_detail))
        .route("/author/{id}/update", get(author_update_form).post(author_update))
        .route("/author/{id}/delete", get(author_delete_form).post(author_delete))
        .route("/genres", get(genre_list))
        .route("/genre/create", get(genre_create_form).post(genre_create))
        .route("/genre/{id}", get(genre_detail))
        .route("/genre/{id}/update", get(genre_update_form).post(genre_update))
        .route("/genre/{id}/delete", get(genre_delete_form).post(genre_delete))
        .with_state(state)
}

#[utoipa::path(get, path = "/", tag = "catalog",
    responses((status = 200, description = "Home page with record counts")))]
pub(crate) async fn index(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.index().await)
}

// ---------------------------------------------------------------- books

#[utoipa::path(get, path = "/books", tag = "books",
    responses((status = 200, description = "Books sorted by title")))]
pub(crate) async fn book_list(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.book_list().await)
}

#[utoipa::path(get, path = "/book/{id}", tag = "books",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book with its copies"),
        (status = 404, description = "Book not found"),
    ))]
pub(crate) async fn book_detail(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    state.respond(state.catalog.book_detail(&id).await)
}

#[utoipa::path(get, path = "/book/create", tag = "books",
    responses((status = 200, description = "Empty book form")))]
pub(crate) async fn book_create_form(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.book_create_form().await)
}

#[utoipa::path(post, path = "/book/create", tag = "books",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirect to the book"),
        (status = 200, description = "Form re-rendered with errors"),
    ))]
pub(crate) async fn book_create(State(state): State<CatalogState>, Fields(form): Fields) -> Page {
    state.respond(state.catalog.book_create(&form).await)
}

#[utoipa::path(get, path = "/book/{id}/update", tag = "books",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book form with current values"),
        (status = 404, description = "Book not found"),
    ))]
pub(crate) async fn book_update_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.book_update_form(&id).await)
}

#[utoipa::path(post, path = "/book/{id}/update", tag = "books",
    params(("id" = String, Path, description = "Book id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated; redirect to the book"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Book not found"),
    ))]
pub(crate) async fn book_update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.book_update(&id, &form).await)
}

#[utoipa::path(get, path = "/book/{id}/delete", tag = "books",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Delete confirmation"),
        (status = 303, description = "Unknown book; redirect to the list"),
    ))]
pub(crate) async fn book_delete_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.book_delete_form(&id).await)
}

#[utoipa::path(post, path = "/book/{id}/delete", tag = "books",
    params(("id" = String, Path, description = "Ignored; the body's `bookid` names the book")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted or unknown; redirect to the list"),
        (status = 200, description = "Blocked by copies; confirmation re-rendered"),
    ))]
pub(crate) async fn book_delete(
    State(state): State<CatalogState>,
    Path(_id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.book_delete(&form).await)
}

// ---------------------------------------------------------------- book instances

#[utoipa::path(get, path = "/bookinstances", tag = "bookinstances",
    responses((status = 200, description = "Every copy with its book")))]
pub(crate) async fn bookinstance_list(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.bookinstance_list().await)
}

#[utoipa::path(get, path = "/bookinstance/{id}", tag = "bookinstances",
    params(("id" = String, Path, description = "Copy id")),
    responses(
        (status = 200, description = "Copy with its book"),
        (status = 404, description = "Book copy not found"),
    ))]
pub(crate) async fn bookinstance_detail(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.bookinstance_detail(&id).await)
}

#[utoipa::path(get, path = "/bookinstance/create", tag = "bookinstances",
    responses((status = 200, description = "Empty copy form")))]
pub(crate) async fn bookinstance_create_form(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.bookinstance_create_form().await)
}

#[utoipa::path(post, path = "/bookinstance/create", tag = "bookinstances",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirect to the copy"),
        (status = 200, description = "Form re-rendered with errors"),
    ))]
pub(crate) async fn bookinstance_create(
    State(state): State<CatalogState>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.bookinstance_create(&form).await)
}

#[utoipa::path(get, path = "/bookinstance/{id}/update", tag = "bookinstances",
    params(("id" = String, Path, description = "Copy id")),
    responses(
        (status = 200, description = "Copy form with current values"),
        (status = 404, description = "Book copy not found"),
    ))]
pub(crate) async fn bookinstance_update_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.bookinstance_update_form(&id).await)
}

#[utoipa::path(post, path = "/bookinstance/{id}/update", tag = "bookinstances",
    params(("id" = String, Path, description = "Copy id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated; redirect to the copy"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Book copy not found"),
    ))]
pub(crate) async fn bookinstance_update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.bookinstance_update(&id, &form).await)
}

#[utoipa::path(get, path = "/bookinstance/{id}/delete", tag = "bookinstances",
    params(("id" = String, Path, description = "Copy id")),
    responses(
        (status = 200, description = "Delete confirmation"),
        (status = 303, description = "Unknown copy; redirect to the list"),
    ))]
pub(crate) async fn bookinstance_delete_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.bookinstance_delete_form(&id).await)
}

#[utoipa::path(post, path = "/bookinstance/{id}/delete", tag = "bookinstances",
    params(("id" = String, Path, description = "Ignored; the body's `bookinstanceid` names the copy")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the list")))]
pub(crate) async fn bookinstance_delete(
    State(state): State<CatalogState>,
    Path(_id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.bookinstance_delete(&form).await)
}

// ---------------------------------------------------------------- authors

#[utoipa::path(get, path = "/authors", tag = "authors",
    responses((status = 200, description = "Authors sorted by family name")))]
pub(crate) async fn author_list(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.author_list().await)
}

#[utoipa::path(get, path = "/author/{id}", tag = "authors",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author with their books"),
        (status = 404, description = "Author not found"),
    ))]
pub(crate) async fn author_detail(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.author_detail(&id).await)
}

#[utoipa::path(get, path = "/author/create", tag = "authors",
    responses((status = 200, description = "Empty author form")))]
pub(crate) async fn author_create_form(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.author_create_form().await)
}

#[utoipa::path(post, path = "/author/create", tag = "authors",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirect to the author"),
        (status = 200, description = "Form re-rendered with errors"),
    ))]
pub(crate) async fn author_create(State(state): State<CatalogState>, Fields(form): Fields) -> Page {
    state.respond(state.catalog.author_create(&form).await)
}

#[utoipa::path(get, path = "/author/{id}/update", tag = "authors",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author form with current values"),
        (status = 404, description = "Author not found"),
    ))]
pub(crate) async fn author_update_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.author_update_form(&id).await)
}

#[utoipa::path(post, path = "/author/{id}/update", tag = "authors",
    params(("id" = String, Path, description = "Author id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated; redirect to the author"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Author not found"),
    ))]
pub(crate) async fn author_update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.author_update(&id, &form).await)
}

#[utoipa::path(get, path = "/author/{id}/delete", tag = "authors",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Delete confirmation"),
        (status = 303, description = "Unknown author; redirect to the list"),
    ))]
pub(crate) async fn author_delete_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.author_delete_form(&id).await)
}

#[utoipa::path(post, path = "/author/{id}/delete", tag = "authors",
    params(("id" = String, Path, description = "Ignored; the body's `authorid` names the author")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted or unknown; redirect to the list"),
        (status = 200, description = "Blocked by books; confirmation re-rendered"),
    ))]
pub(crate) async fn author_delete(
    State(state): State<CatalogState>,
    Path(_id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.author_delete(&form).await)
}

// ---------------------------------------------------------------- genres

#[utoipa::path(get, path = "/genres", tag = "genres",
    responses((status = 200, description = "Genres sorted by name")))]
pub(crate) async fn genre_list(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.genre_list().await)
}

#[utoipa::path(get, path = "/genre/{id}", tag = "genres",
    params(("id" = String, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Genre with its books"),
        (status = 404, description = "Genre not found"),
    ))]
pub(crate) async fn genre_detail(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.genre_detail(&id).await)
}

#[utoipa::path(get, path = "/genre/create", tag = "genres",
    responses((status = 200, description = "Empty genre form")))]
pub(crate) async fn genre_create_form(State(state): State<CatalogState>) -> Page {
    state.respond(state.catalog.genre_create_form().await)
}

#[utoipa::path(post, path = "/genre/create", tag = "genres",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created or already present; redirect to the genre"),
        (status = 200, description = "Form re-rendered with errors"),
    ))]
pub(crate) async fn genre_create(State(state): State<CatalogState>, Fields(form): Fields) -> Page {
    state.respond(state.catalog.genre_create(&form).await)
}

#[utoipa::path(get, path = "/genre/{id}/update", tag = "genres",
    params(("id" = String, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Genre form with current values"),
        (status = 404, description = "Genre not found"),
    ))]
pub(crate) async fn genre_update_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.genre_update_form(&id).await)
}

#[utoipa::path(post, path = "/genre/{id}/update", tag = "genres",
    params(("id" = String, Path, description = "Genre id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated; redirect to the genre"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "Genre not found"),
    ))]
pub(crate) async fn genre_update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.genre_update(&id, &form).await)
}

#[utoipa::path(get, path = "/genre/{id}/delete", tag = "genres",
    params(("id" = String, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Delete confirmation"),
        (status = 303, description = "Unknown genre; redirect to the list"),
    ))]
pub(crate) async fn genre_delete_form(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Page {
    state.respond(state.catalog.genre_delete_form(&id).await)
}

#[utoipa::path(post, path = "/genre/{id}/delete", tag = "genres",
    params(("id" = String, Path, description = "Ignored; the body's `genreid` names the genre")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Deleted or unknown; redirect to the list"),
        (status = 200, description = "Blocked by books; confirmation re-rendered"),
    ))]
pub(crate) async fn genre_delete(
    State(state): State<CatalogState>,
    Path(_id): Path<String>,
    Fields(form): Fields,
) -> Page {
    state.respond(state.catalog.genre_delete(&form).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use locallib_http::JsonRenderer;

    use super::*;
    use crate::modules::catalog::workflow::testing;

    fn app() -> Router {
        let (catalog, _) = testing::catalog();
        router(CatalogState::new(catalog, Arc::new(JsonRenderer)))
    }

    async fn json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_post_redirects_with_see_other() {
        let response = app()
            .oneshot(post("/genre/create", "name=Fantasy"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/catalog/genre/"));
    }

    #[tokio::test]
    async fn invalid_post_renders_form_with_ok() {
        let response = app()
            .oneshot(post("/genre/create", "name=Fa"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["view"], "genre_form");
        assert_eq!(body["model"]["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn undecodable_body_is_400_with_error_envelope() {
        let request = Request::post("/genre/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Fantasy"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "bad_request");
        assert!(!body["error"]["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_genre_keys_reach_the_workflow() {
        let response = app()
            .oneshot(post("/book/create", "title=T&genre=not-an-id&genre=also-bad"))
            .await
            .unwrap();

        let body = json(response).await;
        assert_eq!(body["view"], "book_form");
        assert_eq!(body["model"]["book"]["genre"], serde_json::json!(["not-an-id", "also-bad"]));
    }

    #[tokio::test]
    async fn unknown_record_is_404_with_error_envelope() {
        let response = app()
            .oneshot(Request::get("/author/not-an-id").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["error"]["message"], "Author not found");
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn storage_failure_is_500_without_details() {
        let (_, store) = testing::catalog();
        let app = router(CatalogState::new(
            testing::failing(store, true),
            Arc::new(JsonRenderer),
        ));

        let response = app
            .oneshot(Request::get("/genres").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["error"]["message"], "An internal server error occurred");
    }
}
