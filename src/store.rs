//! State store — last-write-wins property values mirrored to the peer.
//!
//! DESIGN
//! ======
//! Mutation is single-threaded: every change happens inside one
//! message-handling turn, either from a host-side method call or from an
//! inbound peer envelope. An accepted host-side `set` returns exactly one
//! outbound `state` body; the caller owns transmission. `get` returns the
//! last known value, which may be stale until the peer's next update.
//!
//! ERROR HANDLING
//! ==============
//! A rejected assignment leaves the prior value untouched. Rejections are
//! typed (`StoreError`) and carry enough context to be surfaced verbatim.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::envelope::{Body, ErrorCode};
use crate::property::{PropertyKind, PropertySpec};

// =============================================================================
// TYPES
// =============================================================================

/// Which side attempted a rejected write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    Host,
    Peer,
}

impl std::fmt::Display for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Peer => write!(f, "peer"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("property {name} expects {expected}, got {got}")]
    TypeMismatch { name: String, expected: &'static str, got: String },
    #[error("property {name} is not writable by the {writer}")]
    NotWritable { name: String, writer: Writer },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownProperty(_) => "E_PROP_UNKNOWN",
            Self::TypeMismatch { .. } => "E_PROP_TYPE",
            Self::NotWritable { .. } => "E_PROP_READONLY",
        }
    }
}

/// Callback invoked after an accepted change: `(name, new value)`.
pub type Observer = Box<dyn FnMut(&str, &Value) + Send + Sync>;

struct Slot {
    spec: PropertySpec,
    value: Value,
}

/// Declared properties and their last known values.
pub struct StateStore {
    slots: BTreeMap<&'static str, Slot>,
    observers: Vec<(String, Observer)>,
}

// =============================================================================
// STORE
// =============================================================================

impl StateStore {
    /// Build a store from a flavor schema. Property names are unique per
    /// widget; a later spec for the same name replaces the earlier one.
    #[must_use]
    pub fn from_schema(schema: Vec<PropertySpec>) -> Self {
        let mut slots = BTreeMap::new();
        for spec in schema {
            let value = spec.default.clone();
            slots.insert(spec.name, Slot { spec, value });
        }
        Self { slots, observers: Vec::new() }
    }

    /// Last known value, or `None` for an undeclared property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<PropertyKind> {
        self.slots.get(name).map(|slot| slot.spec.kind)
    }

    /// Declared property names, lexicographic.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.keys().copied()
    }

    /// Snapshot of all current values, for mirroring to a newly attached
    /// peer.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.slots.iter().map(|(name, slot)| (*name, slot.value.clone())).collect()
    }

    /// Register an observer for one property. Fires after every accepted
    /// change to that property, from either side.
    pub fn observe(&mut self, name: impl Into<String>, observer: Observer) {
        self.observers.push((name.into(), observer));
    }

    /// Host-side assignment. On success the new value is immediately
    /// visible via [`get`](Self::get) and exactly one outbound `state` body
    /// is returned for transmission.
    ///
    /// # Errors
    ///
    /// Rejects unknown names, type mismatches, and writes to peer-owned
    /// properties; the prior value is retained on every rejection.
    pub fn set(&mut self, name: &str, value: Value) -> Result<Body, StoreError> {
        let value = self.write(name, value, Writer::Host)?;
        Ok(Body::State { name: name.to_string(), value })
    }

    /// Apply a peer-originated update (e.g. `clicked_latlng`, `loaded`,
    /// `view_state`). No outbound message: the peer already has the value.
    ///
    /// # Errors
    ///
    /// Same validation as [`set`](Self::set), against the peer direction.
    pub fn apply_peer(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        self.write(name, value, Writer::Peer)?;
        Ok(())
    }

    fn write(&mut self, name: &str, value: Value, writer: Writer) -> Result<Value, StoreError> {
        let Some(slot) = self.slots.get_mut(name) else {
            return Err(StoreError::UnknownProperty(name.to_string()));
        };

        let allowed = match writer {
            Writer::Host => slot.spec.direction.host_writable(),
            Writer::Peer => slot.spec.direction.peer_writable(),
        };
        if !allowed {
            return Err(StoreError::NotWritable { name: name.to_string(), writer });
        }

        if !slot.spec.kind.accepts(&value) {
            return Err(StoreError::TypeMismatch {
                name: name.to_string(),
                expected: slot.spec.kind.as_str(),
                got: json_kind(&value),
            });
        }

        // Last write wins; no merge semantics.
        slot.value = value;
        let value = slot.value.clone();
        for (observed, observer) in &mut self.observers {
            if observed == name {
                observer(name, &value);
            }
        }
        Ok(value)
    }
}

fn json_kind(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
