//! WebSocket handler — bidirectional envelope relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a peer ID and enters a `select!` loop:
//! - Incoming renderer envelopes → applied to the widget's bridge
//! - Broadcast envelopes from host operations or other peers → forwarded
//!
//! The bridge is pure message handling — it validates, mutates state, and
//! fills its outbox. This layer owns all transmission: replies to the
//! sender, broadcast to attached peers, and detach cleanup.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register peer channel → send the attach snapshot
//! 2. Renderer sends envelopes → bridge applies them → outbox broadcast
//! 3. Rejected envelopes → structured `error` reply to the sender only
//! 4. Close → peer channel removed from the session

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::envelope::{Body, Envelope};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Response {
    if !state.widgets.read().await.contains_key(&widget_id) {
        return (StatusCode::NOT_FOUND, "unknown widget").into_response();
    }
    ws.on_upgrade(move |socket| run_ws(socket, state, widget_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, widget_id: Uuid) {
    let peer_id = Uuid::new_v4();

    // Per-connection channel for envelopes broadcast by host operations and
    // other peers.
    let (peer_tx, mut peer_rx) = mpsc::channel::<Envelope>(256);

    // Register the peer and capture the attach snapshot under one lock, so
    // no broadcast can slot in between snapshot and registration.
    let snapshot = {
        let mut widgets = state.widgets.write().await;
        let Some(session) = widgets.get_mut(&widget_id) else {
            return;
        };
        session.peers.insert(peer_id, peer_tx);
        session.bridge.attach_snapshot()
    };

    info!(%widget_id, %peer_id, envelopes = snapshot.len(), "ws: renderer attached");

    let mut alive = true;
    for envelope in &snapshot {
        if send_envelope(&mut socket, envelope).await.is_err() {
            alive = false;
            break;
        }
    }

    while alive {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for envelope in process_inbound_text(&state, widget_id, peer_id, &text).await {
                            if send_envelope(&mut socket, &envelope).await.is_err() {
                                alive = false;
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(envelope) = peer_rx.recv() => {
                if send_envelope(&mut socket, &envelope).await.is_err() {
                    break;
                }
            }
        }
    }

    let mut widgets = state.widgets.write().await;
    if let Some(session) = widgets.get_mut(&widget_id) {
        session.peers.remove(&peer_id);
    }
    info!(%widget_id, %peer_id, "ws: renderer detached");
}

// =============================================================================
// INBOUND
// =============================================================================

/// Apply one inbound text envelope and return replies for the sender.
///
/// Outbox envelopes produced by the bridge (readiness flushes, for one) go
/// to every attached peer; accepted peer property updates are relayed to
/// the other peers so attached renderers stay in sync.
async fn process_inbound_text(
    state: &AppState,
    widget_id: Uuid,
    peer_id: Uuid,
    text: &str,
) -> Vec<Envelope> {
    let parsed: Option<Envelope> = serde_json::from_str(text).ok();

    let (reply, outbound) = {
        let mut widgets = state.widgets.write().await;
        let Some(session) = widgets.get_mut(&widget_id) else {
            return Vec::new();
        };
        match session.bridge.handle_inbound_text(text) {
            Ok(()) => (None, session.bridge.drain_outbox()),
            Err(e) => {
                warn!(%widget_id, %peer_id, error = %e, "ws: inbound envelope rejected");
                let mut err = Envelope::error_from(&e).with_widget_id(widget_id);
                if let Some(envelope) = &parsed {
                    err = err.with_parent_id(envelope.id);
                }
                (Some(err), Vec::new())
            }
        }
    };

    if !outbound.is_empty() {
        broadcast(state, widget_id, &outbound, None).await;
    }
    if reply.is_none() {
        if let Some(envelope) = parsed {
            if matches!(envelope.body, Body::State { .. }) {
                broadcast(state, widget_id, std::slice::from_ref(&envelope), Some(peer_id)).await;
            }
        }
    }

    reply.into_iter().collect()
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Send envelopes to every peer attached to a widget, optionally excluding
/// one. Peers whose channel is gone are pruned.
pub(crate) async fn broadcast(
    state: &AppState,
    widget_id: Uuid,
    envelopes: &[Envelope],
    exclude: Option<Uuid>,
) {
    let targets: Vec<(Uuid, mpsc::Sender<Envelope>)> = {
        let widgets = state.widgets.read().await;
        let Some(session) = widgets.get(&widget_id) else {
            return;
        };
        session
            .peers
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    };

    let mut dead: Vec<Uuid> = Vec::new();
    for (target_id, tx) in targets {
        for envelope in envelopes {
            if tx.send(envelope.clone()).await.is_err() {
                dead.push(target_id);
                break;
            }
        }
    }

    if !dead.is_empty() {
        let mut widgets = state.widgets.write().await;
        if let Some(session) = widgets.get_mut(&widget_id) {
            for target_id in dead {
                session.peers.remove(&target_id);
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_envelope(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), ()> {
    let json = match serde_json::to_string(envelope) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize envelope");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
