use super::*;
use axum::http::StatusCode;
use serde_json::json;

use crate::envelope::Body;
use crate::state::test_helpers::{attach_peer, seed_widget, test_app_state};

async fn create(state: &AppState, engine: &str) -> Uuid {
    let (status, Json(summary)) = create_widget(
        State(state.clone()),
        Json(CreateWidgetBody { engine: engine.to_string(), options: MapOptions::new() }),
    )
    .await
    .expect("create widget");
    assert_eq!(status, StatusCode::CREATED);
    summary.widget_id
}

#[tokio::test]
async fn create_and_get_roundtrip() {
    let state = test_app_state();
    let widget_id = create(&state, "maplibre").await;

    let Json(detail) = get_widget(State(state.clone()), Path(widget_id))
        .await
        .expect("get widget");
    assert_eq!(detail.engine, "maplibre");
    assert!(!detail.ready);
    assert_eq!(detail.state.get("zoom"), Some(&json!(2.0)));

    let Json(summaries) = list_widgets(State(state)).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].widget_id, widget_id);
}

#[tokio::test]
async fn unknown_engine_is_rejected() {
    let state = test_app_state();
    let (status, Json(err)) = create_widget(
        State(state),
        Json(CreateWidgetBody { engine: "googleearth".to_string(), options: MapOptions::new() }),
    )
    .await
    .expect_err("bad engine");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_ENGINE");
}

#[tokio::test]
async fn set_state_broadcasts_to_attached_peers() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, crate::widgets::Engine::MapLibre).await;
    let (_peer_id, mut rx) = attach_peer(&state, widget_id).await;

    set_state(
        State(state.clone()),
        Path(widget_id),
        Json(SetStateBody { name: "zoom".to_string(), value: json!(9.0) }),
    )
    .await
    .expect("set state");

    let envelope = rx.recv().await.expect("state broadcast");
    let Body::State { name, value } = &envelope.body else {
        panic!("expected state body");
    };
    assert_eq!(name, "zoom");
    assert_eq!(value, &json!(9.0));
}

#[tokio::test]
async fn set_state_maps_store_errors_to_statuses() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, crate::widgets::Engine::MapLibre).await;

    let (status, Json(err)) = set_state(
        State(state.clone()),
        Path(widget_id),
        Json(SetStateBody { name: "gravity".to_string(), value: json!(9.8) }),
    )
    .await
    .expect_err("unknown property");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err.code, "E_PROP_UNKNOWN");

    let (status, Json(err)) = set_state(
        State(state),
        Path(widget_id),
        Json(SetStateBody { name: "zoom".to_string(), value: json!("eleven") }),
    )
    .await
    .expect_err("type mismatch");
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.code, "E_PROP_TYPE");
}

#[tokio::test]
async fn calls_are_sequenced_and_result_ids_optional() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, crate::widgets::Engine::MapLibre).await;

    let Json(first) = call_widget(
        State(state.clone()),
        Path(widget_id),
        Json(CallBody {
            method: "panTo".to_string(),
            args: vec![json!([1.0, 2.0])],
            kwargs: BTreeMap::new(),
            expect_result: false,
        }),
    )
    .await
    .expect("first call");
    assert_eq!(first.seq, 1);
    assert!(first.result_id.is_none());

    let Json(second) = call_widget(
        State(state),
        Path(widget_id),
        Json(CallBody {
            method: "queryRenderedFeatures".to_string(),
            args: vec![],
            kwargs: BTreeMap::new(),
            expect_result: true,
        }),
    )
    .await
    .expect("second call");
    assert_eq!(second.seq, 2);
    assert!(second.result_id.is_some());
}

#[tokio::test]
async fn delete_widget_removes_the_session() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, crate::widgets::Engine::Leaflet).await;

    delete_widget(State(state.clone()), Path(widget_id)).await.expect("delete");
    let (status, _) = get_widget(State(state), Path(widget_id)).await.expect_err("gone");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn basemap_catalog_endpoints() {
    let state = test_app_state();

    let Json(entry) = get_basemap(State(state.clone()), Path("ROADMAP".to_string()))
        .await
        .expect("curated entry");
    assert_eq!(entry.name, "Google Maps");
    assert_eq!(entry.max_zoom, 24);

    let (status, Json(err)) = get_basemap(State(state.clone()), Path("Atlantis".to_string()))
        .await
        .expect_err("unknown entry");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err.code, "E_BASEMAP_NOT_FOUND");

    let Json(all) = list_basemaps(
        State(state.clone()),
        Query(BasemapListQuery { free_only: false }),
    )
    .await;
    let Json(free) = list_basemaps(State(state), Query(BasemapListQuery { free_only: true })).await;
    assert!(all.len() > free.len());
    assert!(free.iter().all(|name| !name.starts_with("Stadia")));
}
