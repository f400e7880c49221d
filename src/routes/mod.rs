//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the HTTP widget API and the renderer websocket under a
//! single Axum router. Hosts drive widgets through `/api/widgets`; browser
//! renderers attach through `/api/ws/{widget_id}`.

pub mod widgets;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/widgets", get(widgets::list_widgets).post(widgets::create_widget))
        .route(
            "/api/widgets/{id}",
            get(widgets::get_widget).delete(widgets::delete_widget),
        )
        .route("/api/widgets/{id}/state", patch(widgets::set_state))
        .route("/api/widgets/{id}/call", post(widgets::call_widget))
        .route("/api/widgets/{id}/results/{seq}", get(widgets::take_result))
        .route("/api/basemaps", get(widgets::list_basemaps))
        .route("/api/basemaps/wms", get(widgets::list_wms))
        .route("/api/basemaps/{name}", get(widgets::get_basemap))
        .route("/api/ws/{widget_id}", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
