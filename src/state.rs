//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the live widget sessions and the basemap registry. Each session
//! owns one bridge plus the senders of every attached peer; the `RwLock`
//! serializes message-handling turns, preserving the bridge's
//! single-threaded contract.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::envelope::Envelope;

// =============================================================================
// WIDGET SESSION
// =============================================================================

/// One live widget: its bridge and the renderers currently attached.
pub struct WidgetSession {
    pub bridge: WidgetBridge,
    /// Connected peers: `peer_id` -> sender for outbound envelopes.
    pub peers: HashMap<Uuid, mpsc::Sender<Envelope>>,
}

impl WidgetSession {
    #[must_use]
    pub fn new(bridge: WidgetBridge) -> Self {
        Self { bridge, peers: HashMap::new() }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum — all inner fields
/// are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub widgets: Arc<RwLock<HashMap<Uuid, WidgetSession>>>,
    pub registry: Arc<BasemapRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Arc<BasemapRegistry>) -> Self {
        Self { widgets: Arc::new(RwLock::new(HashMap::new())), registry }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(BasemapRegistry::with_defaults()))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::config::MapOptions;
    use crate::widgets::{Engine, bridge_for};

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::default()
    }

    /// Seed a widget session and return its ID.
    pub async fn seed_widget(state: &AppState, engine: Engine) -> Uuid {
        let bridge = bridge_for(engine, &MapOptions::new());
        let widget_id = bridge.id();
        let mut widgets = state.widgets.write().await;
        widgets.insert(widget_id, WidgetSession::new(bridge));
        widget_id
    }

    /// Attach a peer channel to an existing widget session.
    pub async fn attach_peer(state: &AppState, widget_id: Uuid) -> (Uuid, mpsc::Receiver<Envelope>) {
        let peer_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(64);
        let mut widgets = state.widgets.write().await;
        widgets
            .get_mut(&widget_id)
            .expect("widget should exist")
            .peers
            .insert(peer_id, tx);
        (peer_id, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapOptions;
    use crate::widgets::{Engine, bridge_for};

    #[test]
    fn session_starts_with_no_peers() {
        let session = WidgetSession::new(bridge_for(Engine::Leaflet, &MapOptions::new()));
        assert!(session.peers.is_empty());
        assert!(!session.bridge.is_ready());
    }

    #[tokio::test]
    async fn seeded_widget_is_retrievable() {
        let state = test_helpers::test_app_state();
        let widget_id = test_helpers::seed_widget(&state, Engine::MapLibre).await;

        let widgets = state.widgets.read().await;
        let session = widgets.get(&widget_id).expect("seeded widget");
        assert_eq!(session.bridge.engine(), Engine::MapLibre);
    }
}
