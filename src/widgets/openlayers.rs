//! OpenLayers flavor.

use async_trait::async_trait;
use serde_json::json;

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::config::MapOptions;
use crate::property::{Direction, PropertyKind, PropertySpec};
use crate::widgets::{Engine, MapOps, bridge_for};

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
        PropertySpec::new("bounds", PropertyKind::Bounds, Direction::Bidirectional, json!([0, 0, 0, 0])),
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
        PropertySpec::new("loaded", PropertyKind::Bool, Direction::PeerToHost, json!(false)),
    ]
}

pub struct OpenLayersMap {
    bridge: WidgetBridge,
    registry: &'static BasemapRegistry,
}

impl OpenLayersMap {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        Self { bridge: bridge_for(Engine::OpenLayers, options), registry: BasemapRegistry::shared() }
    }
}

#[async_trait]
impl MapOps for OpenLayersMap {
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
