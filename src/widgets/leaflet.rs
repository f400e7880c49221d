//! Leaflet flavor — raster-tile map widget.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::config::MapOptions;
use crate::property::{Direction, PropertyKind, PropertySpec};
use crate::widgets::{Engine, MapOps, WidgetError, bridge_for, kwargs};

/// Property schema with `options` folded into the defaults.
#[must_use]
pub fn schema(options: &MapOptions) -> Vec<PropertySpec> {
    vec![
        PropertySpec::new(
            "center",
            PropertyKind::LatLng,
            Direction::Bidirectional,
            json!(options.center.unwrap_or([40.0, -100.0])),
        ),
        PropertySpec::new(
            "zoom",
            PropertyKind::Int,
            Direction::Bidirectional,
            json!(options.zoom.unwrap_or(4.0)),
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

pub struct LeafletMap {
    bridge: WidgetBridge,
    registry: &'static BasemapRegistry,
}

impl LeafletMap {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        Self { bridge: bridge_for(Engine::Leaflet, options), registry: BasemapRegistry::shared() }
    }

    /// Add a raster tile layer by URL template.
    ///
    /// # Errors
    /// Queue overflow.
    pub fn add_tile_layer(
        &mut self,
        url: &str,
        name: &str,
        attribution: &str,
        max_zoom: u8,
        opacity: f64,
    ) -> Result<(), WidgetError> {
        let kw = kwargs([
            ("url", json!(url)),
            ("name", json!(name)),
            ("attribution", json!(attribution)),
            ("maxZoom", json!(max_zoom)),
            ("opacity", json!(opacity)),
        ]);
        self.bridge.call("addTileLayer", vec![], kw)?;
        Ok(())
    }

    /// `[lat, lng]` of the last click, or nulls before the first one.
    #[must_use]
    pub fn clicked_latlng(&self) -> Option<&Value> {
        self.bridge.get("clicked_latlng")
    }
}

#[async_trait]
impl MapOps for LeafletMap {
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
