//! Widget construction options and access tokens.
//!
//! DESIGN
//! ======
//! All configuration is explicit and passed at construction. Access tokens
//! default to an explicit `Unset` sentinel; reading an environment variable
//! is an opt-in call, never an ambient process-wide lookup.

use serde::{Deserialize, Serialize};

// =============================================================================
// ACCESS TOKEN
// =============================================================================

/// Provider access credential with an explicit unset state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessToken {
    #[default]
    Unset,
    Token(String),
}

impl AccessToken {
    /// Opt-in environment lookup, e.g. `AccessToken::from_env("MAPBOX_TOKEN")`.
    #[must_use]
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(token) if !token.is_empty() => Self::Token(token),
            _ => Self::Unset,
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Token(token) => Some(token),
        }
    }
}

// =============================================================================
// MAP OPTIONS
// =============================================================================

/// A control requested at construction time, issued once the renderer is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOption {
    pub kind: String,
    pub position: String,
}

/// Construction-time widget configuration. Unset fields keep the flavor's
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapOptions {
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    pub style: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    #[serde(default)]
    pub controls: Vec<ControlOption>,
    #[serde(default)]
    pub token: AccessToken,
}

impl MapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.center = Some([lat, lng]);
        self
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    #[must_use]
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    #[must_use]
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self.height = Some(height.into());
        self
    }

    #[must_use]
    pub fn with_control(mut self, kind: impl Into<String>, position: impl Into<String>) -> Self {
        self.controls.push(ControlOption { kind: kind.into(), position: position.into() });
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.token = token;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_defaults_to_unset() {
        assert_eq!(AccessToken::default(), AccessToken::Unset);
        assert!(!AccessToken::Unset.is_set());
        assert_eq!(AccessToken::Unset.as_option(), None);
    }

    #[test]
    fn from_env_is_explicit_opt_in() {
        // SAFETY: test-local variable name, no concurrent reader.
        unsafe {
            std::env::set_var("MAPBRIDGE_TEST_TOKEN", "pk.abc123");
        }
        assert_eq!(
            AccessToken::from_env("MAPBRIDGE_TEST_TOKEN"),
            AccessToken::Token("pk.abc123".into())
        );
        assert_eq!(AccessToken::from_env("MAPBRIDGE_TEST_TOKEN_MISSING"), AccessToken::Unset);
        unsafe {
            std::env::remove_var("MAPBRIDGE_TEST_TOKEN");
        }
    }

    #[test]
    fn builder_accumulates_options() {
        let options = MapOptions::new()
            .with_center(40.0, -100.0)
            .with_zoom(4.0)
            .with_size("100%", "600px")
            .with_control("navigation", "top-right");

        assert_eq!(options.center, Some([40.0, -100.0]));
        assert_eq!(options.zoom, Some(4.0));
        assert_eq!(options.height.as_deref(), Some("600px"));
        assert_eq!(options.controls.len(), 1);
        assert!(options.style.is_none());
    }
}
