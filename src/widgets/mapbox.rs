//! Mapbox GL flavor. Requires an access token for tile and style requests;
//! an unset token is forwarded as null and left for the renderer to report.

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::config::MapOptions;
use crate::property::{Direction, PropertyKind, PropertySpec};
use crate::widgets::{DrawOps, Engine, MapOps, StyleOps, bridge_for};

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v12";

#[must_use]
pub fn schema(options: &MapOptions) -> Vec<PropertySpec> {
    let token = options
        .token
        .as_option()
        .map_or(serde_json::Value::Null, |t| json!(t));
    vec![
        PropertySpec::new("token", PropertyKind::Str, Direction::HostToPeer, token),
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
            json!(options.height.as_deref().unwrap_or("300px")),
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

pub struct MapboxMap {
    bridge: WidgetBridge,
    registry: &'static BasemapRegistry,
}

impl MapboxMap {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        if !options.token.is_set() {
            warn!("mapbox widget constructed without an access token");
        }
        Self { bridge: bridge_for(Engine::Mapbox, options), registry: BasemapRegistry::shared() }
    }
}

#[async_trait]
impl MapOps for MapboxMap {
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

impl StyleOps for MapboxMap {}

impl DrawOps for MapboxMap {}
