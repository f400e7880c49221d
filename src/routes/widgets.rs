//! Widget lifecycle and host-side operation routes.
//!
//! DESIGN
//! ======
//! Handlers mutate the bridge under the session lock and return plain JSON;
//! anything the bridge queued outbound is broadcast to the attached peers
//! after the lock is released. The REST surface is the host-side entry
//! point for processes that are not in-process Rust callers.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::basemaps::{BasemapEntry, BasemapError};
use crate::bridge::BridgeError;
use crate::config::MapOptions;
use crate::envelope::ErrorCode;
use crate::routes::ws;
use crate::state::{AppState, WidgetSession};
use crate::store::StoreError;
use crate::widgets::{Engine, bridge_for};

// =============================================================================
// REQUEST / RESPONSE SHAPES
// =============================================================================

#[derive(Deserialize)]
pub struct CreateWidgetBody {
    pub engine: String,
    #[serde(default)]
    pub options: MapOptions,
}

#[derive(Debug, Serialize)]
pub struct WidgetSummary {
    pub widget_id: Uuid,
    pub engine: String,
    pub ready: bool,
    pub peers: usize,
    pub queue_len: usize,
}

#[derive(Debug, Serialize)]
pub struct WidgetDetail {
    pub widget_id: Uuid,
    pub engine: String,
    pub ready: bool,
    pub state: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
pub struct SetStateBody {
    pub name: String,
    pub value: Value,
}

#[derive(Deserialize)]
pub struct CallBody {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: BTreeMap<String, Value>,
    /// Tag the call with a result id the renderer echoes back.
    #[serde(default)]
    pub expect_result: bool,
}

#[derive(Serialize)]
pub struct CallResponse {
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<Uuid>,
}

/// Error payload mirroring the wire-level `error` body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bridge_error(err: &BridgeError) -> ApiError {
    let status = match err {
        BridgeError::Store(StoreError::UnknownProperty { .. }) => StatusCode::NOT_FOUND,
        BridgeError::Store(StoreError::TypeMismatch { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        BridgeError::Store(StoreError::NotWritable { .. }) => StatusCode::FORBIDDEN,
        BridgeError::Queue(_) => StatusCode::TOO_MANY_REQUESTS,
        BridgeError::UnsupportedMessage { .. } | BridgeError::MalformedEnvelope { .. } => {
            StatusCode::BAD_REQUEST
        }
    };
    (
        status,
        Json(ErrorResponse {
            code: err.error_code().to_string(),
            message: err.to_string(),
            retryable: err.retryable(),
        }),
    )
}

fn basemap_error(err: &BasemapError) -> ApiError {
    let status = match err {
        BasemapError::NotFound { .. } => StatusCode::NOT_FOUND,
        BasemapError::Duplicate(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            code: err.error_code().to_string(),
            message: err.to_string(),
            retryable: err.retryable(),
        }),
    )
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: "E_NOT_FOUND".to_string(),
            message: format!("unknown {what}"),
            retryable: false,
        }),
    )
}

// =============================================================================
// WIDGET LIFECYCLE
// =============================================================================

/// `POST /api/widgets` — create a widget instance.
pub async fn create_widget(
    State(state): State<AppState>,
    Json(body): Json<CreateWidgetBody>,
) -> Result<(StatusCode, Json<WidgetSummary>), ApiError> {
    let engine: Engine = body.engine.parse().map_err(|e: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { code: "E_ENGINE".to_string(), message: e, retryable: false }),
        )
    })?;

    let bridge = bridge_for(engine, &body.options);
    let widget_id = bridge.id();
    let summary = WidgetSummary {
        widget_id,
        engine: engine.to_string(),
        ready: false,
        peers: 0,
        queue_len: bridge.queue_len(),
    };

    let mut widgets = state.widgets.write().await;
    widgets.insert(widget_id, WidgetSession::new(bridge));
    tracing::info!(%widget_id, %engine, "widget created");

    Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /api/widgets` — list live widgets.
pub async fn list_widgets(State(state): State<AppState>) -> Json<Vec<WidgetSummary>> {
    let widgets = state.widgets.read().await;
    let mut summaries: Vec<WidgetSummary> = widgets
        .values()
        .map(|session| WidgetSummary {
            widget_id: session.bridge.id(),
            engine: session.bridge.engine().to_string(),
            ready: session.bridge.is_ready(),
            peers: session.peers.len(),
            queue_len: session.bridge.queue_len(),
        })
        .collect();
    summaries.sort_by_key(|s| s.widget_id);
    Json(summaries)
}

/// `GET /api/widgets/{id}` — full property snapshot.
pub async fn get_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
) -> Result<Json<WidgetDetail>, ApiError> {
    let widgets = state.widgets.read().await;
    let session = widgets.get(&widget_id).ok_or_else(|| not_found("widget"))?;

    Ok(Json(WidgetDetail {
        widget_id,
        engine: session.bridge.engine().to_string(),
        ready: session.bridge.is_ready(),
        state: session
            .bridge
            .snapshot()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    }))
}

/// `DELETE /api/widgets/{id}` — drop a widget and detach its peers.
pub async fn delete_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut widgets = state.widgets.write().await;
    widgets.remove(&widget_id).ok_or_else(|| not_found("widget"))?;
    tracing::info!(%widget_id, "widget deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

// =============================================================================
// HOST-SIDE OPERATIONS
// =============================================================================

/// `PATCH /api/widgets/{id}/state` — assign one property.
pub async fn set_state(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Json(body): Json<SetStateBody>,
) -> Result<Json<Value>, ApiError> {
    let outbound = {
        let mut widgets = state.widgets.write().await;
        let session = widgets.get_mut(&widget_id).ok_or_else(|| not_found("widget"))?;
        session
            .bridge
            .set(&body.name, body.value)
            .map_err(|e| bridge_error(&e))?;
        session.bridge.drain_outbox()
    };
    ws::broadcast(&state, widget_id, &outbound, None).await;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `POST /api/widgets/{id}/call` — enqueue one renderer call.
pub async fn call_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Json(body): Json<CallBody>,
) -> Result<Json<CallResponse>, ApiError> {
    let (response, outbound) = {
        let mut widgets = state.widgets.write().await;
        let session = widgets.get_mut(&widget_id).ok_or_else(|| not_found("widget"))?;

        let response = if body.expect_result {
            let (seq, result_id) = session
                .bridge
                .call_with_result(body.method, body.args, body.kwargs)
                .map_err(|e| bridge_error(&e))?;
            CallResponse { seq, result_id: Some(result_id) }
        } else {
            let seq = session
                .bridge
                .call(body.method, body.args, body.kwargs)
                .map_err(|e| bridge_error(&e))?;
            CallResponse { seq, result_id: None }
        };
        (response, session.bridge.drain_outbox())
    };
    ws::broadcast(&state, widget_id, &outbound, None).await;
    Ok(Json(response))
}

/// `GET /api/widgets/{id}/results/{seq}` — take a pending call result.
pub async fn take_result(
    State(state): State<AppState>,
    Path((widget_id, seq)): Path<(Uuid, u64)>,
) -> Result<Json<Value>, ApiError> {
    let mut widgets = state.widgets.write().await;
    let session = widgets.get_mut(&widget_id).ok_or_else(|| not_found("widget"))?;
    let value = session.bridge.take_result(seq).ok_or_else(|| not_found("result"))?;
    Ok(Json(value))
}

// =============================================================================
// BASEMAP CATALOG
// =============================================================================

#[derive(Deserialize)]
pub struct BasemapListQuery {
    #[serde(default)]
    pub free_only: bool,
}

/// `GET /api/basemaps` — provider names, lexicographic.
pub async fn list_basemaps(
    State(state): State<AppState>,
    Query(query): Query<BasemapListQuery>,
) -> Json<Vec<String>> {
    Json(state.registry.list(query.free_only))
}

/// `GET /api/basemaps/wms` — WMS service names.
pub async fn list_wms(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.list_wms())
}

/// `GET /api/basemaps/{name}` — resolve one provider.
pub async fn get_basemap(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BasemapEntry>, ApiError> {
    let entry = state.registry.resolve(&name).map_err(|e| basemap_error(&e))?;
    Ok(Json(entry.clone()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "widgets_routes_test.rs"]
mod tests;
