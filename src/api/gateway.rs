/// Gateway call endpoint
///
/// Matches `/call/{appid}/{*path}` to a resource, fills a request context
/// from the query string, body and headers, and runs the resource on the
/// blocking thread pool.

use crate::api::AppState;
use crate::core::{error::CODE_PROCESSING, ApiError, RequestContext};
use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::any,
    Form, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Create gateway call routes
pub fn create_gateway_routes() -> Router<AppState> {
    Router::new().route("/call/{appid}/{*path}", any(call_resource))
}

/// Run the resource serving this call
///
/// ANY /call/{appid}/{*path}
async fn call_resource(
    State(state): State<AppState>,
    Path((appid, path)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    request: Request,
) -> Response {
    tracing::info!("🎯 Call: {} /{}/{}", method, appid, path);

    let Some(route) = state.registry.resolve(&appid, method.as_str(), &path) else {
        tracing::warn!("No resource for {} /{}/{}", method, appid, path);
        return ApiError::NotFound {
            message: format!("resource not found: {}", path),
        }
        .into_response();
    };

    let mut ctx = RequestContext::new(appid, method.as_str());
    ctx.get_vars = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    ctx.post_vars = match read_body(&state, &method, &headers, request).await {
        Ok(vars) => vars,
        Err(response) => return response,
    };
    ctx.token = bearer_token(&headers);
    ctx.out_format = state.gateway.format_from_accept(
        headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok()),
    );

    let gateway = Arc::clone(&state.gateway);
    let outcome = tokio::task::spawn_blocking(move || gateway.handle(&route, &mut ctx)).await;

    match outcome {
        Ok(Ok(response)) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("❌ Call failed: {}", e);
            e.into_response()
        }
        Err(e) => {
            tracing::error!("❌ Evaluation task aborted: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": { "code": CODE_PROCESSING, "message": "evaluation aborted", "id": -1 } })),
            )
                .into_response()
        }
    }
}

/// POST vars from a JSON object or form body
async fn read_body(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    request: Request,
) -> Result<HashMap<String, Value>, Response> {
    if matches!(*method, Method::GET | Method::HEAD | Method::DELETE) {
        return Ok(HashMap::new());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        let Json(body) = Json::<Value>::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;
        return Ok(match body {
            Value::Object(map) => map.into_iter().collect(),
            Value::Null => HashMap::new(),
            other => HashMap::from([("body".to_string(), other)]),
        });
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(form) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;
        return Ok(form
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect());
    }

    Ok(HashMap::new())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}
