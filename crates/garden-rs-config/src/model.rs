//! Configuration schema for the garden.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Default fade window: half of it (three weeks) leaves a memory at 50%.
pub const DEFAULT_DECAY_WINDOW_MS: u64 = 3_628_000_000;

/// Root config for the garden client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GardenConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub decay: DecayConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl GardenConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> GardenConfigBuilder {
        GardenConfigBuilder::new()
    }

    /// The configured backend endpoint, or an error when none is set.
    pub fn require_endpoint(&self) -> Result<&str, ConfigError> {
        self.backend
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or(ConfigError::MissingEndpoint)
    }
}

/// Builder for assembling a `GardenConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct GardenConfigBuilder {
    config: GardenConfig,
}

impl GardenConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: GardenConfig::default(),
        }
    }

    /// Point the client at a backend endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.backend.endpoint = Some(endpoint.into());
        self
    }

    /// Replace the backend configuration.
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    /// Replace the decay configuration.
    pub fn decay(mut self, decay: DecayConfig) -> Self {
        self.config.decay = decay;
        self
    }

    /// Replace the map view configuration.
    pub fn map(mut self, map: MapConfig) -> Self {
        self.config.map = map;
        self
    }

    /// Replace the asset configuration.
    pub fn assets(mut self, assets: AssetsConfig) -> Self {
        self.config.assets = assets;
        self
    }

    /// Replace the terminal UI configuration.
    pub fn ui(mut self, ui: UiConfig) -> Self {
        self.config.ui = ui;
        self
    }

    /// Finalize and return the built `GardenConfig`.
    pub fn build(self) -> GardenConfig {
        self.config
    }
}

/// Remote record store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Script endpoint serving `GET` listings and `POST` forms.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Freshness decay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    #[serde(default = "default_decay_window_ms")]
    pub window_ms: u64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            window_ms: default_decay_window_ms(),
        }
    }
}

fn default_decay_window_ms() -> u64 {
    DEFAULT_DECAY_WINDOW_MS
}

/// Initial view and limits of the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub center: MapCenter,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default)]
    pub bounds: MapBounds,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: MapCenter::default(),
            zoom: default_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            bounds: MapBounds::default(),
        }
    }
}

fn default_zoom() -> u8 {
    2
}

fn default_min_zoom() -> u8 {
    2
}

fn default_max_zoom() -> u8 {
    19
}

/// Center of the initial view in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MapCenter {
    #[serde(default = "default_center_lat")]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

impl Default for MapCenter {
    fn default() -> Self {
        Self {
            lat: default_center_lat(),
            lng: 0.0,
        }
    }
}

fn default_center_lat() -> f64 {
    20.0
}

/// Limits the view may not be panned past.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MapBounds {
    #[serde(default = "default_south")]
    pub south: f64,
    #[serde(default = "default_north")]
    pub north: f64,
    #[serde(default = "default_west")]
    pub west: f64,
    #[serde(default = "default_east")]
    pub east: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            south: default_south(),
            north: default_north(),
            west: default_west(),
            east: default_east(),
        }
    }
}

fn default_south() -> f64 {
    -90.0
}

fn default_north() -> f64 {
    90.0
}

fn default_west() -> f64 {
    -200.0
}

fn default_east() -> f64 {
    200.0
}

/// Where marker and picker images live.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetsConfig {
    /// Prefix joined in front of `<n>.small.png` / `<n>.large.png`.
    #[serde(default)]
    pub base: String,
}

/// Terminal UI timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Delay before a successfully saved form closes itself.
    #[serde(default = "default_close_form_after_ms")]
    pub close_form_after_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            close_form_after_ms: default_close_form_after_ms(),
        }
    }
}

fn default_tick_ms() -> u64 {
    250
}

fn default_close_form_after_ms() -> u64 {
    800
}
