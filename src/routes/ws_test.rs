use super::*;
use std::collections::BTreeMap;

use serde_json::json;

use crate::state::test_helpers::{attach_peer, seed_widget, test_app_state};
use crate::widgets::Engine;

fn to_text(envelope: &Envelope) -> String {
    serde_json::to_string(envelope).expect("serialize")
}

#[tokio::test]
async fn malformed_text_yields_error_reply() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::Leaflet).await;

    let replies = process_inbound_text(&state, widget_id, Uuid::new_v4(), "{not json").await;
    assert_eq!(replies.len(), 1);
    let Body::Error { code, .. } = &replies[0].body else {
        panic!("expected error body");
    };
    assert_eq!(code, "E_MALFORMED");
}

#[tokio::test]
async fn valid_json_with_unknown_shape_is_unsupported() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::Leaflet).await;

    let replies =
        process_inbound_text(&state, widget_id, Uuid::new_v4(), r#"{"type": "teleport"}"#).await;
    assert_eq!(replies.len(), 1);
    let Body::Error { code, .. } = &replies[0].body else {
        panic!("expected error body");
    };
    assert_eq!(code, "E_UNSUPPORTED");
}

#[tokio::test]
async fn ready_flush_is_broadcast_to_attached_peers() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::MapLibre).await;
    {
        let mut widgets = state.widgets.write().await;
        let session = widgets.get_mut(&widget_id).expect("widget");
        session
            .bridge
            .call_when_ready("addDrawControl", vec![json!({})], BTreeMap::new())
            .expect("stage");
    }
    let (_peer_id, mut rx) = attach_peer(&state, widget_id).await;

    let ready = to_text(&Envelope::new(Body::Ready));
    let replies = process_inbound_text(&state, widget_id, Uuid::new_v4(), &ready).await;
    assert!(replies.is_empty());

    let flushed = rx.recv().await.expect("flush broadcast");
    let Body::Calls { calls } = &flushed.body else {
        panic!("expected calls body");
    };
    assert_eq!(calls[0].method, "addDrawControl");
    assert_eq!(calls[0].seq, 1);
}

#[tokio::test]
async fn peer_state_update_is_relayed_to_other_peers_only() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::MapLibre).await;
    let (sender_id, mut sender_rx) = attach_peer(&state, widget_id).await;
    let (_other_id, mut other_rx) = attach_peer(&state, widget_id).await;

    let update = to_text(&Envelope::state("center", json!([48.85, 2.35])));
    let replies = process_inbound_text(&state, widget_id, sender_id, &update).await;
    assert!(replies.is_empty());

    let relayed = other_rx.recv().await.expect("relay");
    assert!(matches!(relayed.body, Body::State { .. }));
    assert!(sender_rx.try_recv().is_err(), "sender must not see an echo");

    let widgets = state.widgets.read().await;
    assert_eq!(
        widgets.get(&widget_id).expect("widget").bridge.get("center"),
        Some(&json!([48.85, 2.35]))
    );
}

#[tokio::test]
async fn rejected_peer_write_replies_without_relaying() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::MapLibre).await;
    let (sender_id, _sender_rx) = attach_peer(&state, widget_id).await;
    let (_other_id, mut other_rx) = attach_peer(&state, widget_id).await;

    // `style` flows host to peer only.
    let envelope = Envelope::state("style", json!("https://example.com/style.json"));
    let replies = process_inbound_text(&state, widget_id, sender_id, &to_text(&envelope)).await;

    assert_eq!(replies.len(), 1);
    let Body::Error { code, .. } = &replies[0].body else {
        panic!("expected error body");
    };
    assert_eq!(code, "E_PROP_READONLY");
    assert_eq!(replies[0].parent_id, Some(envelope.id));
    assert!(other_rx.try_recv().is_err(), "rejected update must not propagate");
}

#[tokio::test]
async fn broadcast_prunes_disconnected_peers() {
    let state = test_app_state();
    let widget_id = seed_widget(&state, Engine::Leaflet).await;
    let (_peer_id, rx) = attach_peer(&state, widget_id).await;
    drop(rx);

    broadcast(&state, widget_id, &[Envelope::new(Body::Ready)], None).await;

    let widgets = state.widgets.read().await;
    assert!(widgets.get(&widget_id).expect("widget").peers.is_empty());
}
