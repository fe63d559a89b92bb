use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};

/// Module registry driving the module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        tracing::debug!(module = module.name(), "registering module");
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Collect the collections declared by every module, deduplicated
    pub fn collect_collections(&self) -> Vec<&'static str> {
        let mut collections: Vec<&'static str> = self
            .modules
            .iter()
            .flat_map(|module| module.collections())
            .collect();
        collections.sort_unstable();
        collections.dedup();
        collections
    }

    /// Register every declared collection with the store
    pub async fn prepare_storage(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for collection in self.collect_collections() {
            ctx.db
                .ensure_collection(collection)
                .await
                .with_context(|| format!("failed to prepare collection '{collection}'"))?;
        }
        Ok(())
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
