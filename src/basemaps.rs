//! Basemap registry — named tile sources usable as map backgrounds.
//!
//! DESIGN
//! ======
//! The registry merges two curated tables (XYZ and WMS services) with an
//! embedded provider catalog. The catalog is a typed tree: a node is either
//! a leaf provider or a category of providers, traversed recursively — no
//! runtime probing, no exception-driven control flow. Lookup is backed by
//! `BTreeMap`, so listings are lexicographic by name.
//!
//! ERROR HANDLING
//! ==============
//! `resolve` failures enumerate every valid name. Registering a name twice
//! is rejected explicitly; nothing is ever silently overwritten.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::envelope::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// A named XYZ tile source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasemapEntry {
    pub name: String,
    pub url: String,
    pub attribution: String,
    pub max_zoom: u8,
    /// Whether the provider requires an access credential.
    pub requires_token: bool,
}

/// A named WMS service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WmsEntry {
    pub name: String,
    pub url: String,
    pub layers: String,
    pub format: String,
    pub transparent: bool,
    pub attribution: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BasemapError {
    #[error("basemap not found: {name}; it must be one of: {}", .valid.join(", "))]
    NotFound { name: String, valid: Vec<String> },
    #[error("basemap already registered: {0}")]
    Duplicate(String),
}

impl ErrorCode for BasemapError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_BASEMAP_NOT_FOUND",
            Self::Duplicate(_) => "E_BASEMAP_DUPLICATE",
        }
    }
}

// =============================================================================
// PROVIDER CATALOG
// =============================================================================

/// One provider in the embedded catalog.
#[derive(Debug, Clone, Copy)]
pub struct TileProvider {
    pub name: &'static str,
    pub url: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
    pub requires_token: bool,
}

/// Catalog node: a leaf provider or a named category of further nodes.
#[derive(Debug, Clone, Copy)]
pub enum CatalogNode {
    Leaf(TileProvider),
    Category(&'static str, &'static [CatalogNode]),
}

impl CatalogNode {
    /// Collect every leaf provider under this node, depth first.
    fn collect_leaves(&self, out: &mut Vec<TileProvider>) {
        match self {
            Self::Leaf(provider) => out.push(*provider),
            Self::Category(_, children) => {
                for child in *children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

const fn leaf(
    name: &'static str,
    url: &'static str,
    attribution: &'static str,
    max_zoom: u8,
) -> CatalogNode {
    CatalogNode::Leaf(TileProvider { name, url, attribution, max_zoom, requires_token: false })
}

const fn token_leaf(
    name: &'static str,
    url: &'static str,
    attribution: &'static str,
    max_zoom: u8,
) -> CatalogNode {
    CatalogNode::Leaf(TileProvider { name, url, attribution, max_zoom, requires_token: true })
}

/// Embedded catalog of well-known tile providers.
pub const CATALOG: &[CatalogNode] = &[
    CatalogNode::Category("OpenStreetMap", &[
        leaf(
            "OpenStreetMap.Mapnik",
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors",
            19,
        ),
        leaf(
            "OpenStreetMap.DE",
            "https://tile.openstreetmap.de/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors",
            18,
        ),
        leaf(
            "OpenStreetMap.France",
            "https://{s}.tile.openstreetmap.fr/osmfr/{z}/{x}/{y}.png",
            "(C) OpenStreetMap France",
            20,
        ),
        leaf(
            "OpenStreetMap.HOT",
            "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors, Humanitarian OSM Team",
            19,
        ),
    ]),
    leaf(
        "OpenTopoMap",
        "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
        "(C) OpenStreetMap contributors, SRTM | (C) OpenTopoMap",
        17,
    ),
    CatalogNode::Category("CartoDB", &[
        leaf(
            "CartoDB.Positron",
            "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors, (C) CARTO",
            20,
        ),
        leaf(
            "CartoDB.DarkMatter",
            "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors, (C) CARTO",
            20,
        ),
        leaf(
            "CartoDB.Voyager",
            "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}.png",
            "(C) OpenStreetMap contributors, (C) CARTO",
            20,
        ),
    ]),
    CatalogNode::Category("Esri", &[
        leaf(
            "Esri.WorldStreetMap",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
            "Tiles (C) Esri",
            19,
        ),
        leaf(
            "Esri.WorldImagery",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            "Tiles (C) Esri",
            19,
        ),
        leaf(
            "Esri.WorldTopoMap",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}",
            "Tiles (C) Esri",
            19,
        ),
        leaf(
            "Esri.NatGeoWorldMap",
            "https://server.arcgisonline.com/ArcGIS/rest/services/NatGeo_World_Map/MapServer/tile/{z}/{y}/{x}",
            "Tiles (C) Esri, National Geographic",
            16,
        ),
    ]),
    CatalogNode::Category("Stadia", &[
        token_leaf(
            "Stadia.AlidadeSmooth",
            "https://tiles.stadiamaps.com/tiles/alidade_smooth/{z}/{x}/{y}{r}.png?api_key={apiKey}",
            "(C) Stadia Maps, (C) OpenMapTiles, (C) OpenStreetMap contributors",
            20,
        ),
        token_leaf(
            "Stadia.AlidadeSmoothDark",
            "https://tiles.stadiamaps.com/tiles/alidade_smooth_dark/{z}/{x}/{y}{r}.png?api_key={apiKey}",
            "(C) Stadia Maps, (C) OpenMapTiles, (C) OpenStreetMap contributors",
            20,
        ),
    ]),
    CatalogNode::Category("Thunderforest", &[
        token_leaf(
            "Thunderforest.OpenCycleMap",
            "https://{s}.tile.thunderforest.com/cycle/{z}/{x}/{y}.png?apikey={apiKey}",
            "(C) Thunderforest, (C) OpenStreetMap contributors",
            22,
        ),
        token_leaf(
            "Thunderforest.Landscape",
            "https://{s}.tile.thunderforest.com/landscape/{z}/{x}/{y}.png?apikey={apiKey}",
            "(C) Thunderforest, (C) OpenStreetMap contributors",
            22,
        ),
        token_leaf(
            "Thunderforest.Outdoors",
            "https://{s}.tile.thunderforest.com/outdoors/{z}/{x}/{y}.png?apikey={apiKey}",
            "(C) Thunderforest, (C) OpenStreetMap contributors",
            22,
        ),
    ]),
];

// =============================================================================
// CURATED TABLES
// =============================================================================

struct CustomXyz {
    key: &'static str,
    name: &'static str,
    url: &'static str,
    attribution: &'static str,
}

/// Hand-maintained XYZ services, keyed by display name. All free, all
/// served at up to zoom 24.
const CUSTOM_XYZ: &[CustomXyz] = &[
    CustomXyz {
        key: "OpenStreetMap",
        name: "OpenStreetMap",
        url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "OpenStreetMap",
    },
    CustomXyz {
        key: "ROADMAP",
        name: "Google Maps",
        url: "https://mt1.google.com/vt/lyrs=m&x={x}&y={y}&z={z}",
        attribution: "Google",
    },
    CustomXyz {
        key: "SATELLITE",
        name: "Google Satellite",
        url: "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}",
        attribution: "Google",
    },
    CustomXyz {
        key: "TERRAIN",
        name: "Google Terrain",
        url: "https://mt1.google.com/vt/lyrs=p&x={x}&y={y}&z={z}",
        attribution: "Google",
    },
    CustomXyz {
        key: "HYBRID",
        name: "Google Satellite",
        url: "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}",
        attribution: "Google",
    },
];

struct CustomWms {
    key: &'static str,
    name: &'static str,
    url: &'static str,
    layers: &'static str,
    attribution: &'static str,
}

const fn nlcd(key: &'static str, layers: &'static str, url: &'static str) -> CustomWms {
    CustomWms { key, name: key, url, layers, attribution: "MRLC" }
}

const fn naip(key: &'static str, layers: &'static str) -> CustomWms {
    CustomWms {
        key,
        name: key,
        url: "https://imagery.nationalmap.gov/arcgis/services/USGSNAIPImagery/ImageServer/WMSServer?",
        layers,
        attribution: "USGS",
    }
}

const fn worldcover(key: &'static str, name: &'static str, layers: &'static str) -> CustomWms {
    CustomWms { key, name, url: "https://services.terrascope.be/wms/v2", layers, attribution: "ESA" }
}

/// Hand-maintained WMS services: wetlands, the NLCD land-cover series,
/// NAIP aerial imagery, USGS hydrography and elevation, and the ESA
/// WorldCover products.
const CUSTOM_WMS: &[CustomWms] = &[
    CustomWms {
        key: "FWS NWI Wetlands",
        name: "FWS NWI Wetlands",
        url: "https://www.fws.gov/wetlands/arcgis/services/Wetlands/MapServer/WMSServer?",
        layers: "1",
        attribution: "FWS",
    },
    CustomWms {
        key: "FWS NWI Wetlands Raster",
        name: "FWS NWI Wetlands Raster",
        url: "https://www.fws.gov/wetlands/arcgis/services/Wetlands_Raster/ImageServer/WMSServer?",
        layers: "0",
        attribution: "FWS",
    },
    nlcd(
        "NLCD 2019 CONUS Land Cover",
        "NLCD_2019_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2019_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2016 CONUS Land Cover",
        "NLCD_2016_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2016_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2013 CONUS Land Cover",
        "NLCD_2013_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2013_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2011 CONUS Land Cover",
        "NLCD_2011_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2011_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2008 CONUS Land Cover",
        "NLCD_2008_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2008_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2006 CONUS Land Cover",
        "NLCD_2006_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2006_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2004 CONUS Land Cover",
        "NLCD_2004_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2004_Land_Cover_L48/wms?",
    ),
    nlcd(
        "NLCD 2001 CONUS Land Cover",
        "NLCD_2001_Land_Cover_L48",
        "https://www.mrlc.gov/geoserver/mrlc_display/NLCD_2001_Land_Cover_L48/wms?",
    ),
    naip("USGS NAIP Imagery", "USGSNAIPImagery:NaturalColor"),
    naip("USGS NAIP Imagery False Color", "USGSNAIPImagery:FalseColorComposite"),
    naip("USGS NAIP Imagery NDVI", "USGSNAIPImagery:NDVI_Color"),
    CustomWms {
        key: "USGS Hydrography",
        name: "USGS Hydrography",
        url: "https://basemap.nationalmap.gov/arcgis/services/USGSHydroCached/MapServer/WMSServer?",
        layers: "0",
        attribution: "USGS",
    },
    CustomWms {
        key: "USGS 3DEP Elevation",
        name: "USGS 3DEP Elevation",
        url: "https://elevation.nationalmap.gov/arcgis/services/3DEPElevation/ImageServer/WMSServer?",
        layers: "33DEPElevation:Hillshade Elevation Tinted",
        attribution: "USGS",
    },
    worldcover("ESA WorldCover 2020", "ESA Worldcover 2020", "WORLDCOVER_2020_MAP"),
    worldcover("ESA WorldCover 2020 S2 FCC", "ESA Worldcover 2020 S2 FCC", "WORLDCOVER_2020_S2_FCC"),
    worldcover("ESA WorldCover 2020 S2 TCC", "ESA Worldcover 2020 S2 TCC", "WORLDCOVER_2020_S2_TCC"),
    worldcover("ESA WorldCover 2021", "ESA Worldcover 2021", "WORLDCOVER_2021_MAP"),
    worldcover("ESA WorldCover 2021 S2 FCC", "ESA Worldcover 2021 S2 FCC", "WORLDCOVER_2021_S2_FCC"),
    worldcover("ESA WorldCover 2021 S2 TCC", "ESA Worldcover 2021 S2 TCC", "WORLDCOVER_2021_S2_TCC"),
];

// =============================================================================
// REGISTRY
// =============================================================================

pub struct BasemapRegistry {
    entries: BTreeMap<String, BasemapEntry>,
    wms: BTreeMap<String, WmsEntry>,
}

impl BasemapRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self { entries: BTreeMap::new(), wms: BTreeMap::new() }
    }

    /// The curated tables plus every catalog leaf. The two sets are
    /// disjoint by construction (catalog names are provider-qualified,
    /// e.g. `OpenStreetMap.Mapnik`), so construction cannot fail.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        for custom in CUSTOM_XYZ {
            let entry = BasemapEntry {
                name: custom.name.to_string(),
                url: custom.url.to_string(),
                attribution: custom.attribution.to_string(),
                max_zoom: 24,
                requires_token: false,
            };
            registry
                .register(custom.key, entry)
                .unwrap_or_else(|_| unreachable!("curated XYZ keys are unique"));
        }

        let mut leaves = Vec::new();
        for node in CATALOG {
            node.collect_leaves(&mut leaves);
        }
        for provider in leaves {
            let entry = BasemapEntry {
                name: provider.name.to_string(),
                url: provider.url.to_string(),
                attribution: provider.attribution.to_string(),
                max_zoom: provider.max_zoom,
                requires_token: provider.requires_token,
            };
            registry
                .register(provider.name, entry)
                .unwrap_or_else(|_| unreachable!("catalog names are provider-qualified"));
        }

        for custom in CUSTOM_WMS {
            let entry = WmsEntry {
                name: custom.name.to_string(),
                url: custom.url.to_string(),
                layers: custom.layers.to_string(),
                format: "image/png".to_string(),
                transparent: true,
                attribution: custom.attribution.to_string(),
            };
            registry
                .register_wms(custom.key, entry)
                .unwrap_or_else(|_| unreachable!("curated WMS keys are unique"));
        }

        registry
    }

    /// Process-wide default registry. The data is static, so one build is
    /// enough.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<BasemapRegistry> = OnceLock::new();
        SHARED.get_or_init(Self::with_defaults)
    }

    /// Register an XYZ entry under `key`.
    ///
    /// # Errors
    ///
    /// Rejects a key that is already registered.
    pub fn register(&mut self, key: impl Into<String>, entry: BasemapEntry) -> Result<(), BasemapError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(BasemapError::Duplicate(key));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Register a WMS entry under `key`.
    ///
    /// # Errors
    ///
    /// Rejects a key that is already registered.
    pub fn register_wms(&mut self, key: impl Into<String>, entry: WmsEntry) -> Result<(), BasemapError> {
        let key = key.into();
        if self.wms.contains_key(&key) {
            return Err(BasemapError::Duplicate(key));
        }
        self.wms.insert(key, entry);
        Ok(())
    }

    /// Look up an XYZ entry by key.
    ///
    /// # Errors
    ///
    /// Not-found failures enumerate every valid key.
    pub fn resolve(&self, name: &str) -> Result<&BasemapEntry, BasemapError> {
        self.entries.get(name).ok_or_else(|| BasemapError::NotFound {
            name: name.to_string(),
            valid: self.list(false),
        })
    }

    /// Look up a WMS entry by key.
    ///
    /// # Errors
    ///
    /// Not-found failures enumerate every valid key.
    pub fn resolve_wms(&self, name: &str) -> Result<&WmsEntry, BasemapError> {
        self.wms.get(name).ok_or_else(|| BasemapError::NotFound {
            name: name.to_string(),
            valid: self.wms.keys().cloned().collect(),
        })
    }

    /// Registered XYZ keys, lexicographic. With `free_only`, keys whose
    /// provider requires an access credential are excluded.
    #[must_use]
    pub fn list(&self, free_only: bool) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !free_only || !entry.requires_token)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Registered WMS keys, lexicographic.
    #[must_use]
    pub fn list_wms(&self) -> Vec<String> {
        self.wms.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BasemapRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "basemaps_test.rs"]
mod tests;
