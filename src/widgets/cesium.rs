//! Cesium flavor — 3D globe. Carries an `altitude` property alongside the
//! usual camera state, and an ion access token.

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::basemaps::BasemapRegistry;
use crate::bridge::WidgetBridge;
use crate::config::MapOptions;
use crate::property::{Direction, PropertyKind, PropertySpec};
use crate::widgets::{Engine, MapOps, WidgetError, bridge_for};

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
            json!(options.center.unwrap_or([40.0, -100.0])),
        ),
        PropertySpec::new(
            "zoom",
            PropertyKind::Float,
            Direction::Bidirectional,
            json!(options.zoom.unwrap_or(4.0)),
        ),
        PropertySpec::new("bounds", PropertyKind::Bounds, Direction::Bidirectional, json!([0, 0, 0, 0])),
        PropertySpec::new("altitude", PropertyKind::Float, Direction::Bidirectional, json!(0.0)),
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

pub struct CesiumMap {
    bridge: WidgetBridge,
    registry: &'static BasemapRegistry,
}

impl CesiumMap {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        if !options.token.is_set() {
            warn!("cesium widget constructed without an ion access token");
        }
        Self { bridge: bridge_for(Engine::Cesium, options), registry: BasemapRegistry::shared() }
    }

    /// Camera height above the ellipsoid, in meters.
    ///
    /// # Errors
    /// Store validation failures.
    pub fn set_altitude(&mut self, altitude: f64) -> Result<(), WidgetError> {
        self.bridge.set("altitude", json!(altitude))?;
        Ok(())
    }
}

#[async_trait]
impl MapOps for CesiumMap {
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
