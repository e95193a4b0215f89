/// Server setup and initialization
///
/// Wires together all components: processor registry, resource storage and
/// registry, validator, request pipeline, and HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_gateway_routes, create_resource_routes, AppState},
    config::Config,
    processor::ProcessorRegistry,
    resource::{ResourceRegistry, ResourceStorage, ResourceValidator},
    runtime::Gateway,
};
use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes and middleware
///
/// Opens the resource database, loads every stored resource into the
/// hot-reload registry and builds the shared application state.
pub async fn create_app(config: Config) -> Result<Router> {
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            tracing::info!("📁 Ensuring data directory exists: {}", parent.display());
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
        }
    }

    let storage = ResourceStorage::connect(&config.database.path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open resource database: {}", e))?;

    build_app(config, storage).await
}

/// Build the application on top of an already opened storage
pub async fn build_app(config: Config, storage: ResourceStorage) -> Result<Router> {
    tracing::info!("🧩 Initializing processor registry");
    let processors = Arc::new(
        ProcessorRegistry::with_builtins()
            .map_err(|e| anyhow::anyhow!("Failed to register built-in processors: {}", e))?,
    );

    tracing::info!("📊 Initializing resource registry");
    let registry = Arc::new(ResourceRegistry::new(storage.clone()));
    tracing::info!("📥 Loading existing resources from storage");
    registry
        .init_from_storage()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load resources from storage: {}", e))?;

    tracing::info!(
        "🚀 Initializing gateway (cache: {}, default format: {})",
        config.gateway.cache_enabled,
        config.gateway.default_format
    );
    let gateway = Arc::new(Gateway::new(
        Arc::clone(&processors),
        config.gateway.cache_enabled,
        config.gateway.default_format.clone(),
    ));

    let app_state = AppState {
        storage,
        registry,
        validator: Arc::new(ResourceValidator::new(Arc::clone(&processors))),
        processors,
        gateway,
    };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_resource_routes())
        .merge(create_gateway_routes())
        .layer(DefaultBodyLimit::max(config.gateway.max_body))
        .with_state(app_state);

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Gaterway server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
