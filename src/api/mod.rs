/// HTTP API Layer
///
/// This module provides the REST API endpoints for resource management
/// and the gateway call surface. It handles:
/// - Resource import, listing, export and deletion
/// - Processor contract listing
/// - Dispatching calls to the matched resource

use crate::core::ApiError;
use crate::processor::ProcessorRegistry;
use crate::resource::{ResourceRegistry, ResourceStorage, ResourceValidator};
use crate::runtime::Gateway;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

// Resource management and processor listing endpoints
pub mod resources;

// Gateway call endpoint (/call/{appid}/{*path})
pub mod gateway;

// Re-export router builders
pub use gateway::create_gateway_routes;
pub use resources::create_resource_routes;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Resource storage for persistence
    pub storage: ResourceStorage,
    /// Hot-reload registry for in-memory resources
    pub registry: Arc<ResourceRegistry>,
    /// Built-in processors, shared read-only
    pub processors: Arc<ProcessorRegistry>,
    pub validator: Arc<ResourceValidator>,
    /// Request pipeline (evaluator, cache)
    pub gateway: Arc<Gateway>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

/// Log a persistence failure and surface it as a storage error
pub(crate) fn storage_error(context: &str, error: anyhow::Error) -> ApiError {
    tracing::error!("❌ {}: {}", context, error);
    ApiError::Storage(format!("{}: {}", context, error))
}
