//! Property schema — declared shape of synchronized widget state.
//!
//! DESIGN
//! ======
//! Each widget flavor declares its properties up front: name, value kind,
//! sync direction, and default. The store validates every assignment against
//! the declared kind and rejects writes that go against the declared
//! direction, so a bad value never reaches the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// TYPES
// =============================================================================

/// Value kind a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Bool,
    Int,
    Float,
    Str,
    /// `[lat, lng]` pair. Elements may be null before the first interaction
    /// (e.g. `clicked_latlng`).
    LatLng,
    /// `[west, south, east, north]` quad.
    Bounds,
    List,
    Object,
}

impl PropertyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::LatLng => "latlng",
            Self::Bounds => "bounds",
            Self::List => "list",
            Self::Object => "object",
        }
    }

    /// Whether `value` matches this kind. Null is accepted everywhere: it is
    /// the unset sentinel for peer-originated fields and tokens.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => is_integral(value),
            Self::Float => value.is_number(),
            Self::Str => value.is_string(),
            Self::LatLng => is_coord_array(value, 2),
            Self::Bounds => is_coord_array(value, 4),
            Self::List => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

fn is_integral(value: &Value) -> bool {
    if value.is_i64() || value.is_u64() {
        return true;
    }
    // JSON has one number type; accept floats with a zero fraction.
    value.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn is_coord_array(value: &Value, len: usize) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    items.len() == len && items.iter().all(|v| v.is_number() || v.is_null())
}

/// Who is allowed to mutate a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HostToPeer,
    PeerToHost,
    Bidirectional,
}

impl Direction {
    #[must_use]
    pub fn host_writable(self) -> bool {
        matches!(self, Self::HostToPeer | Self::Bidirectional)
    }

    #[must_use]
    pub fn peer_writable(self) -> bool {
        matches!(self, Self::PeerToHost | Self::Bidirectional)
    }
}

/// Declaration of one synchronized property.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub direction: Direction,
    pub default: Value,
}

impl PropertySpec {
    #[must_use]
    pub fn new(name: &'static str, kind: PropertyKind, direction: Direction, default: Value) -> Self {
        Self { name, kind, direction, default }
    }
}

// =============================================================================
// TESTS
// =============================================================================
