//! Local library catalog application.
//!
//! Wires the catalog module into the kernel registry and the HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;

use locallib_db::{InMemoryStore, SharedStore};
use locallib_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Store and registry with every module registered and prepared.
pub struct App {
    pub store: SharedStore,
    pub registry: ModuleRegistry,
}

/// Register the modules over a fresh in-memory store, create their
/// collections, then run `init` and `start`.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<App> {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &store);

    let ctx = InitCtx {
        settings,
        db: &store,
    };
    registry
        .prepare_storage(&ctx)
        .await
        .context("failed to prepare storage")?;
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    Ok(App { store, registry })
}

/// Serve until Ctrl-C, then stop every module.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.name,
        seed = settings.database.seed_demo_data,
        "locallib bootstrap starting"
    );

    let app = bootstrap(&settings).await?;

    locallib_http::start_server(&app.registry, &settings, shutdown_signal()).await?;

    app.registry.stop_modules().await?;
    tracing::info!("locallib shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
