//! MapLibre GL flavor — the full style-driven widget.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::config::MapOptions;
use crate::property::{Direction, PropertyKind, PropertySpec};
use crate::widgets::{DrawOps, Engine, MapOps, StyleOps, bridge_for};

pub const DEFAULT_STYLE: &str = "https://demotiles.maplibre.org/style.json";

#[must_use]
pub fn schema(options: &MapOptions) -> Vec<PropertySpec> {
    vec![
        PropertySpec::new(
            "center",
            PropertyKind::LatLng,
            Direction::Bidirectional,
            json!(options.center.unwrap_or([0.0, 20.0])),
        ),
        PropertySpec::new(
            "zoom",
            PropertyKind::Float,
            Direction::Bidirectional,
            json!(options.zoom.unwrap_or(2.0)),
        ),
        PropertySpec::new(
            "bearing",
            PropertyKind::Float,
            Direction::Bidirectional,
            json!(options.bearing.unwrap_or(0.0)),
        ),
        PropertySpec::new(
            "pitch",
            PropertyKind::Float,
            Direction::Bidirectional,
            json!(options.pitch.unwrap_or(0.0)),
        ),
        PropertySpec::new(
            "style",
            PropertyKind::Str,
            Direction::HostToPeer,
            json!(options.style.as_deref().unwrap_or(DEFAULT_STYLE)),
        ),
        PropertySpec::new(
            "width",
            PropertyKind::Str,
            Direction::HostToPeer,
            json!(options.width.as_deref().unwrap_or("100%")),
        ),
        PropertySpec::new(
            "height",
            PropertyKind::Str,
            Direction::HostToPeer,
            json!(options.height.as_deref().unwrap_or("600px")),
        ),
        PropertySpec::new("esm", PropertyKind::Str, Direction::HostToPeer, json!(null)),
        PropertySpec::new("css", PropertyKind::Str, Direction::HostToPeer, json!(null)),
        PropertySpec::new(
            "clicked_latlng",
            PropertyKind::LatLng,
            Direction::PeerToHost,
            json!([null, null]),
        ),
        PropertySpec::new("view_state", PropertyKind::Object, Direction::PeerToHost, json!({})),
        PropertySpec::new("loaded", PropertyKind::Bool, Direction::PeerToHost, json!(false)),
        PropertySpec::new("draw_features_selected", PropertyKind::List, Direction::PeerToHost, json!([])),
        PropertySpec::new("draw_features_created", PropertyKind::List, Direction::PeerToHost, json!([])),
        PropertySpec::new("draw_features_updated", PropertyKind::List, Direction::PeerToHost, json!([])),
        PropertySpec::new("draw_features_deleted", PropertyKind::List, Direction::PeerToHost, json!([])),
    ]
}

pub struct MapLibreMap {
    bridge: WidgetBridge,
    registry: &'static BasemapRegistry,
}

impl MapLibreMap {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        Self { bridge: bridge_for(Engine::MapLibre, options), registry: BasemapRegistry::shared() }
    }

    /// GeoJSON features currently selected in the draw control.
    #[must_use]
    pub fn draw_features_selected(&self) -> Option<&Value> {
        self.bridge.get("draw_features_selected")
    }
}

#[async_trait]
impl MapOps for MapLibreMap {
    fn bridge(&self) -> &WidgetBridge {
        &self.bridge
    }

    fn bridge_mut(&mut self) -> &mut WidgetBridge {
        &mut self.bridge
    }

    fn registry(&self) -> &BasemapRegistry {
        self.registry
    }
}

impl StyleOps for MapLibreMap {}

impl DrawOps for MapLibreMap {}
