use async_trait::async_trait;
use axum::Router;

use locallib_db::SharedStore;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a SharedStore,
}

/// Core module trait that all catalog modules must implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module; also its mount path
    fn name(&self) -> &'static str;

    /// Collections this module reads and writes
    /// They are registered with the store before `init` runs
    fn collections(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Initialize the module with the provided context
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Will be merged with other modules' specs
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background work for this module
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources
    /// Called during application shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
