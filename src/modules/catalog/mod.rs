pub mod assembler;
pub mod drafts;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod validation;
pub mod views;
pub mod workflow;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use utoipa::OpenApi;

use locallib_db::{Entity, SharedStore};
use locallib_http::{JsonRenderer, Renderer};
use locallib_kernel::{InitCtx, Module};

use handlers::CatalogState;
use models::{Author, Book, BookInstance, BookStatus, Genre};
use workflow::Catalog;

/// Collections owned by the catalog.
pub const COLLECTIONS: &[&str] = &[
    Book::COLLECTION,
    Author::COLLECTION,
    Genre::COLLECTION,
    BookInstance::COLLECTION,
];

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index,
        handlers::book_list,
        handlers::book_detail,
        handlers::book_create_form,
        handlers::book_create,
        handlers::book_update_form,
        handlers::book_update,
        handlers::book_delete_form,
        handlers::book_delete,
        handlers::bookinstance_list,
        handlers::bookinstance_detail,
        handlers::bookinstance_create_form,
        handlers::bookinstance_create,
        handlers::bookinstance_update_form,
        handlers::bookinstance_update,
        handlers::bookinstance_delete_form,
        handlers::bookinstance_delete,
        handlers::author_list,
        handlers::author_detail,
        handlers::author_create_form,
        handlers::author_create,
        handlers::author_update_form,
        handlers::author_update,
        handlers::author_delete_form,
        handlers::author_delete,
        handlers::genre_list,
        handlers::genre_detail,
        handlers::genre_create_form,
        handlers::genre_create,
        handlers::genre_update_form,
        handlers::genre_update,
        handlers::genre_delete_form,
        handlers::genre_delete,
    ),
    components(schemas(Book, Author, Genre, BookInstance, BookStatus))
)]
struct CatalogApi;

/// Books, authors, genres and copies, mounted at `/catalog`.
pub struct CatalogModule {
    catalog: Catalog,
    renderer: Arc<dyn Renderer>,
}

impl CatalogModule {
    pub fn new(store: SharedStore, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            catalog: Catalog::new(store),
            renderer,
        }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn collections(&self) -> Vec<&'static str> {
        COLLECTIONS.to_vec()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.settings.database.name,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        handlers::router(CatalogState::new(
            self.catalog.clone(),
            self.renderer.clone(),
        ))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        match serde_json::to_value(CatalogApi::openapi()) {
            Ok(spec) => Some(spec),
            Err(err) => {
                tracing::warn!(module = self.name(), error = %err, "failed to encode OpenAPI fragment");
                None
            }
        }
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.seed_demo_data {
            seed::populate(&self.catalog)
                .await
                .context("failed to load demo catalog")?;
        }
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create the catalog module over `store`, rendering views as JSON.
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(CatalogModule::new(store, Arc::new(JsonRenderer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use locallib_kernel::settings::Settings;

    #[test]
    fn declares_every_collection() {
        let module = create_module(workflow::testing::store());
        assert_eq!(
            module.collections(),
            vec!["books", "authors", "genres", "bookinstances"]
        );
    }

    #[test]
    fn openapi_fragment_carries_paths_and_schemas() {
        let module = create_module(workflow::testing::store());
        let spec = module.openapi().unwrap();
        assert!(spec["paths"]["/books"]["get"].is_object());
        assert!(spec["paths"]["/genre/{id}/delete"]["post"].is_object());
        assert!(spec["components"]["schemas"]["BookInstance"].is_object());
    }

    #[tokio::test]
    async fn start_seeds_only_when_configured() {
        let store: SharedStore = workflow::testing::store();
        let module = create_module(store.clone());
        let mut settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
            db: &store,
        };
        module.start(&ctx).await.unwrap();
        let catalog = Catalog::new(store.clone());
        assert_eq!(
            catalog.books().count(&locallib_db::Filter::all()).await.unwrap(),
            0
        );

        settings.database.seed_demo_data = true;
        let ctx = InitCtx {
            settings: &settings,
            db: &store,
        };
        module.start(&ctx).await.unwrap();
        assert_eq!(
            catalog.books().count(&locallib_db::Filter::all()).await.unwrap(),
            7
        );
    }
}
