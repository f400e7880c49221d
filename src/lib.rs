//! Host↔renderer synchronization bridge for embeddable map widgets.
//!
//! ARCHITECTURE
//! ============
//! A widget is a pair: a host-side bridge (this crate) and a front-end
//! renderer (Leaflet, MapLibre, Mapbox, OpenLayers, or Cesium). The two
//! halves exchange envelopes — property updates, incremental call batches,
//! readiness, acknowledgments — over whatever transport the embedding
//! provides. This crate ships one such transport: an Axum websocket relay.
//!
//! LAYERS
//! ======
//! - [`envelope`] — the universal wire message
//! - [`store`] / [`queue`] / [`readiness`] — per-widget synchronized state,
//!   the sequenced call queue, and the two-state readiness gate
//! - [`bridge`] — composes the three into one widget's host half
//! - [`peer`] — the renderer half, generic over a [`peer::Renderer`]
//! - [`widgets`] — typed per-engine APIs over the bridge
//! - [`basemaps`] / [`fetch`] / [`config`] — tile provider registry,
//!   remote resource fetching, construction options
//! - [`state`] / [`routes`] — the serving layer

pub mod basemaps;
pub mod bridge;
pub mod config;
pub mod envelope;
pub mod fetch;
pub mod peer;
pub mod property;
pub mod queue;
pub mod readiness;
pub mod routes;
pub mod state;
pub mod store;
pub mod widgets;

pub use bridge::WidgetBridge;
pub use config::{AccessToken, MapOptions};
pub use envelope::{Body, Envelope};
pub use widgets::{DrawOps, Engine, MapOps, StyleOps};
