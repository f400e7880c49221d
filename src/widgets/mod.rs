//! Widget flavors — thin typed APIs over the bridge.
//!
//! ARCHITECTURE
//! ============
//! Each flavor (Leaflet, MapLibre, Mapbox, OpenLayers, Cesium) declares its
//! property schema and defaults, then forwards every imperative action as a
//! call record. Shared operations live on the [`MapOps`] trait; style/layer
//! operations on [`StyleOps`] for the GL flavors; drawing and legends on
//! [`DrawOps`]. Method names on the wire are the renderer's own camelCase
//! API names.

pub mod cesium;
pub mod leaflet;
pub mod mapbox;
pub mod maplibre;
pub mod openlayers;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::basemaps::{BasemapError, BasemapRegistry};
use crate::bridge::{BridgeError, WidgetBridge};
use crate::config::MapOptions;
use crate::envelope::ErrorCode;
use crate::fetch::{self, FetchConfig, FetchError};
use crate::queue::QueueConfig;

// =============================================================================
// ENGINE
// =============================================================================

/// Front-end rendering engine a widget pairs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Leaflet,
    MapLibre,
    Mapbox,
    OpenLayers,
    Cesium,
}

impl Engine {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leaflet => "leaflet",
            Self::MapLibre => "maplibre",
            Self::Mapbox => "mapbox",
            Self::OpenLayers => "openlayers",
            Self::Cesium => "cesium",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leaflet" => Ok(Self::Leaflet),
            "maplibre" => Ok(Self::MapLibre),
            "mapbox" => Ok(Self::Mapbox),
            "openlayers" => Ok(Self::OpenLayers),
            "cesium" => Ok(Self::Cesium),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Basemap(#[from] BasemapError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ErrorCode for WidgetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Bridge(e) => e.error_code(),
            Self::Basemap(e) => e.error_code(),
            Self::Fetch(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Bridge(e) => e.retryable(),
            Self::Basemap(e) => e.retryable(),
            Self::Fetch(e) => e.retryable(),
        }
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

/// Build a bridge for `engine` with the flavor's schema and the options
/// folded into the defaults. Controls requested up front are staged for the
/// readiness flush.
#[must_use]
pub fn bridge_for(engine: Engine, options: &MapOptions) -> WidgetBridge {
    let schema = match engine {
        Engine::Leaflet => leaflet::schema(options),
        Engine::MapLibre => maplibre::schema(options),
        Engine::Mapbox => mapbox::schema(options),
        Engine::OpenLayers => openlayers::schema(options),
        Engine::Cesium => cesium::schema(options),
    };
    let mut bridge = WidgetBridge::new(engine, schema, QueueConfig::default());
    for control in &options.controls {
        // Staging cannot overflow, and the bridge is not ready yet.
        let _ = bridge.call_when_ready(
            "addControl",
            vec![json!(control.kind), json!(control.position)],
            BTreeMap::new(),
        );
    }
    bridge
}

/// Shorthand for building a kwargs map.
#[must_use]
pub fn kwargs<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

// =============================================================================
// SHARED OPERATIONS
// =============================================================================

/// Operations every flavor supports.
#[async_trait]
pub trait MapOps {
    fn bridge(&self) -> &WidgetBridge;
    fn bridge_mut(&mut self) -> &mut WidgetBridge;
    fn registry(&self) -> &BasemapRegistry;

    /// Last known value of a synchronized property.
    fn get(&self, name: &str) -> Option<&Value> {
        self.bridge().get(name)
    }

    /// # Errors
    /// Store validation failures.
    fn set_center(&mut self, lat: f64, lng: f64) -> Result<(), WidgetError> {
        self.bridge_mut().set("center", json!([lat, lng]))?;
        Ok(())
    }

    /// # Errors
    /// Store validation failures.
    fn set_zoom(&mut self, zoom: f64) -> Result<(), WidgetError> {
        self.bridge_mut().set("zoom", json!(zoom))?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn pan_to(&mut self, lat: f64, lng: f64) -> Result<(), WidgetError> {
        self.bridge_mut().call("panTo", vec![json!([lat, lng])], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn fly_to(&mut self, lat: f64, lng: f64, zoom: Option<f64>) -> Result<(), WidgetError> {
        let mut kw = kwargs([("center", json!([lng, lat]))]);
        if let Some(zoom) = zoom {
            kw.insert("zoom".to_string(), json!(zoom));
        }
        self.bridge_mut().call("flyTo", vec![], kw)?;
        Ok(())
    }

    /// Fit the view to `[west, south, east, north]`.
    ///
    /// # Errors
    /// Queue overflow.
    fn fit_bounds(&mut self, bounds: [f64; 4]) -> Result<(), WidgetError> {
        self.bridge_mut().call("fitBounds", vec![json!(bounds)], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn resize(&mut self) -> Result<(), WidgetError> {
        self.bridge_mut().call("resize", vec![], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn add_control(&mut self, kind: &str, position: &str) -> Result<(), WidgetError> {
        self.bridge_mut()
            .call("addControl", vec![json!(kind), json!(position)], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn remove_control(&mut self, kind: &str) -> Result<(), WidgetError> {
        self.bridge_mut().call("removeControl", vec![json!(kind)], BTreeMap::new())?;
        Ok(())
    }

    /// Add a registered basemap as a background layer.
    ///
    /// # Errors
    /// Unknown basemap name (the message lists every valid one), queue
    /// overflow.
    fn add_basemap(&mut self, name: &str, opacity: f64) -> Result<(), WidgetError> {
        let entry = self.registry().resolve(name)?.clone();
        let kw = kwargs([
            ("url", json!(entry.url)),
            ("attribution", json!(entry.attribution)),
            ("maxZoom", json!(entry.max_zoom)),
            ("opacity", json!(opacity)),
            ("name", json!(name)),
        ]);
        self.bridge_mut().call("addBasemap", vec![], kw)?;
        Ok(())
    }

    /// Replace the renderer module source. `spec` may be the source itself,
    /// a file path, or an http(s) URL.
    ///
    /// # Errors
    /// Fetch failures for file/URL specs, store validation failures.
    async fn set_esm(&mut self, client: &reqwest::Client, spec: &str) -> Result<(), WidgetError>
    where
        Self: Send,
    {
        let source = fetch::resolve_source(client, spec, &FetchConfig::default()).await?;
        self.bridge_mut().set("esm", json!(source))?;
        Ok(())
    }

    /// Replace the renderer stylesheet. `spec` may be the stylesheet
    /// itself, a file path, or an http(s) URL.
    ///
    /// # Errors
    /// Fetch failures for file/URL specs, store validation failures.
    async fn set_css(&mut self, client: &reqwest::Client, spec: &str) -> Result<(), WidgetError>
    where
        Self: Send,
    {
        let sheet = fetch::resolve_source(client, spec, &FetchConfig::default()).await?;
        self.bridge_mut().set("css", json!(sheet))?;
        Ok(())
    }
}

/// Style and layer operations for the style-driven flavors.
pub trait StyleOps: MapOps {
    /// # Errors
    /// Queue overflow.
    fn add_source(&mut self, id: &str, source: Value) -> Result<(), WidgetError> {
        self.bridge_mut().call("addSource", vec![json!(id), source], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn remove_source(&mut self, id: &str) -> Result<(), WidgetError> {
        self.bridge_mut().call("removeSource", vec![json!(id)], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn add_layer(&mut self, layer: Value, before_id: Option<&str>) -> Result<(), WidgetError> {
        let kw = match before_id {
            Some(before) => kwargs([("beforeId", json!(before))]),
            None => BTreeMap::new(),
        };
        self.bridge_mut().call("addLayer", vec![layer], kw)?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn remove_layer(&mut self, id: &str) -> Result<(), WidgetError> {
        self.bridge_mut().call("removeLayer", vec![json!(id)], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn set_paint_property(&mut self, layer: &str, name: &str, value: Value) -> Result<(), WidgetError> {
        self.bridge_mut()
            .call("setPaintProperty", vec![json!(layer), json!(name), value], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn set_layout_property(&mut self, layer: &str, name: &str, value: Value) -> Result<(), WidgetError> {
        self.bridge_mut()
            .call("setLayoutProperty", vec![json!(layer), json!(name), value], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn set_filter(&mut self, layer: &str, filter: Value) -> Result<(), WidgetError> {
        self.bridge_mut().call("setFilter", vec![json!(layer), filter], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Store validation failures.
    fn set_style(&mut self, style: &str) -> Result<(), WidgetError> {
        self.bridge_mut().set("style", json!(style))?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn set_layer_visibility(&mut self, id: &str, visible: bool) -> Result<(), WidgetError> {
        let visibility = if visible { "visible" } else { "none" };
        self.set_layout_property(id, "visibility", json!(visibility))
    }

    /// # Errors
    /// Store validation failures.
    fn set_pitch(&mut self, pitch: f64) -> Result<(), WidgetError> {
        self.bridge_mut().set("pitch", json!(pitch))?;
        Ok(())
    }

    /// # Errors
    /// Store validation failures.
    fn set_bearing(&mut self, bearing: f64) -> Result<(), WidgetError> {
        self.bridge_mut().set("bearing", json!(bearing))?;
        Ok(())
    }
}

/// Drawing and legend operations. Deferred until the renderer is ready.
pub trait DrawOps: MapOps {
    /// # Errors
    /// Queue overflow after readiness.
    fn add_draw_control(&mut self, options: Value) -> Result<(), WidgetError> {
        self.bridge_mut().call_when_ready("addDrawControl", vec![options], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn remove_draw_control(&mut self) -> Result<(), WidgetError> {
        self.bridge_mut().call("removeDrawControl", vec![], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow after readiness.
    fn set_draw_mode(&mut self, mode: &str) -> Result<(), WidgetError> {
        self.bridge_mut().call_when_ready("setDrawMode", vec![json!(mode)], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow.
    fn draw_features_delete_all(&mut self) -> Result<(), WidgetError> {
        self.bridge_mut().call("deleteAllDrawFeatures", vec![], BTreeMap::new())?;
        Ok(())
    }

    /// # Errors
    /// Queue overflow after readiness.
    fn add_legend(&mut self, title: &str, entries: Value) -> Result<(), WidgetError> {
        let kw = kwargs([("title", json!(title)), ("entries", entries)]);
        self.bridge_mut().call_when_ready("addLegend", vec![], kw)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "widgets_test.rs"]
mod tests;
