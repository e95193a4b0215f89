/// Resource management REST API endpoints
///
/// Provides import, export and deletion of resource definitions with
/// hot-reload support, plus the processor contract catalogue used by
/// resource authors. Every import is validated before it is stored.

use crate::api::{storage_error, AppState};
use crate::core::{ApiError, ApiResult};
use crate::resource::{Resource, ResourceDocument};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response for resource creation/update operations
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// "json" (default) or "yaml"
    pub format: Option<String>,
}

/// Create resource management routes
pub fn create_resource_routes() -> Router<AppState> {
    Router::new()
        .route("/api/resources", get(list_resources).post(create_resource))
        .route(
            "/api/resources/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route("/api/processors", get(list_processors))
        .route("/api/processors/{machine_name}", get(get_processor))
}

/// Import a new resource
///
/// POST /api/resources
/// Body: a JSON or YAML resource document
async fn create_resource(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ResourceResponse>> {
    let document = parse_and_validate(&state, &body)?;

    if let Some(existing) = find_route(&state, &document).await? {
        tracing::warn!(
            "Route {} {} already served by resource {}",
            document.method.to_uppercase(),
            document.uri,
            existing
        );
        return Err(ApiError::Conflict {
            message: format!("a resource already exists for {} {}", document.method, document.uri),
        });
    }

    let id = uuid::Uuid::new_v4().to_string();
    let name = document.name.clone();
    store(&state, Resource::from_document(id.clone(), document)).await?;

    tracing::info!("🔥 Created resource: {} ({})", id, name);
    Ok(Json(ResourceResponse {
        id,
        message: format!("Resource '{}' created successfully", name),
    }))
}

/// Replace an existing resource
///
/// PUT /api/resources/{id}
async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<ResourceResponse>> {
    let document = parse_and_validate(&state, &body)?;

    match state.storage.get_resource(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(&id)),
        Err(e) => return Err(storage_error("Failed to load resource", e)),
    }

    if let Some(existing) = find_route(&state, &document).await? {
        if existing != id {
            return Err(ApiError::Conflict {
                message: format!("a resource already exists for {} {}", document.method, document.uri),
            });
        }
    }

    let name = document.name.clone();
    store(&state, Resource::from_document(id.clone(), document)).await?;

    tracing::info!("🔥 Hot-reloaded resource: {} ({})", id, name);
    Ok(Json(ResourceResponse {
        id,
        message: format!("Resource '{}' updated successfully", name),
    }))
}

/// List all resources
///
/// GET /api/resources
async fn list_resources(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let resources = state
        .storage
        .list_resources()
        .await
        .map_err(|e| storage_error("Failed to list resources", e))?;
    Ok(Json(json!({ "resources": resources })))
}

/// Export a resource in import-document shape
///
/// GET /api/resources/{id}?format=yaml
async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let resource = state
        .storage
        .get_resource(&id)
        .await
        .map_err(|e| storage_error("Failed to load resource", e))?
        .ok_or_else(|| not_found(&id))?;
    let document = resource.to_document_value();

    match query.format.as_deref() {
        Some("yaml") | Some("yml") => {
            let yaml = serde_yaml::to_string(&document)
                .map_err(|e| ApiError::Storage(format!("unable to encode YAML: {}", e)))?;
            Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml).into_response())
        }
        _ => Ok(Json(document).into_response()),
    }
}

/// Delete a resource
///
/// DELETE /api/resources/{id}
async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.registry.remove_resource(&id);

    let deleted = state
        .storage
        .delete_resource(&id)
        .await
        .map_err(|e| storage_error("Failed to delete resource", e))?;
    if !deleted {
        return Err(not_found(&id));
    }

    tracing::info!("Deleted resource: {}", id);
    Ok(Json(json!({ "message": "Resource deleted successfully" })))
}

/// Every processor contract, grouped by namespace
///
/// GET /api/processors
async fn list_processors(State(state): State<AppState>) -> Json<Value> {
    let processors: Vec<Value> = state
        .processors
        .contracts()
        .into_iter()
        .map(|(namespace, contract)| json!({ "namespace": namespace, "details": &*contract }))
        .collect();
    Json(json!({ "processors": processors }))
}

/// GET /api/processors/{machine_name}
async fn get_processor(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
) -> ApiResult<Json<Value>> {
    let resolved = state.processors.resolve(&machine_name)?;
    Ok(Json(json!({
        "namespace": resolved.namespace,
        "details": &*resolved.contract,
    })))
}

fn parse_and_validate(state: &AppState, body: &str) -> ApiResult<ResourceDocument> {
    let document = ResourceDocument::parse(body)?;
    state.validator.validate(&document.meta).map_err(|e| {
        tracing::warn!("⚠️ Rejected resource '{}': {}", document.name, e);
        e
    })?;
    Ok(document)
}

async fn find_route(state: &AppState, document: &ResourceDocument) -> ApiResult<Option<String>> {
    state
        .storage
        .find_route(&document.appid, &document.method, &document.uri)
        .await
        .map_err(|e| storage_error("Failed to look up route", e))
}

/// Persist, then hot-reload into the registry
async fn store(state: &AppState, resource: Resource) -> ApiResult<()> {
    state
        .storage
        .save_resource(&resource)
        .await
        .map_err(|e| storage_error("Failed to save resource", e))?;
    state
        .registry
        .reload_resource(&resource.id)
        .await
        .map_err(|e| storage_error("Failed to reload resource into registry", e))
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound {
        message: format!("resource not found: {}", id),
    }
}
