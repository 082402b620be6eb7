//! Layered configuration loader.
//!
//! Discovers configuration layers (system/user/project/etc), validates each
//! against the schema, merges them, applies the environment override, and
//! produces a final `GardenConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;


use crate::{ConfigError, GardenConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "garden.json5";
/// Default config directory under user or repo roots.
const DEFAULT_CONFIG_DIR: &str = ".garden";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];
/// Environment variable overriding `backend.endpoint`.
pub const ENV_ENDPOINT: &str = "GARDEN_ENDPOINT";

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/garden/garden.json5";
#[cfg(windows)]
/// Default system config path on Windows.
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\garden\\garden.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: GardenConfig,
    /// Metadata for each layer that contributed.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Current working directory configuration.
    Cwd,
    /// Repo-local `.garden/` configuration.
    Repo,
    /// Explicit override files.
    Runtime,
    /// Endpoint taken from the environment (highest precedence).
    Environment,
}

/// Metadata about a config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk, if the layer came from a file.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve local layers.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/garden/garden.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.garden/garden.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied after file discovery.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
    /// Endpoint applied last; seeded from `GARDEN_ENDPOINT`.
    pub endpoint_override: Option<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        let cwd = cwd.as_ref().to_path_buf();
        Self {
            cwd,
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            endpoint_override: std::env::var(ENV_ENDPOINT)
                .ok()
                .filter(|value| !value.trim().is_empty()),
        }
    }

    /// Add a runtime override config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Force the backend endpoint regardless of file layers.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }
}

impl GardenConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, project, cwd, repo,
    /// runtime files, environment endpoint.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut values = Vec::new();
        let mut seen_paths = HashSet::new();

        for (source, path) in [
            (
                ConfigLayerSource::System,
                options.system_config_path.as_deref(),
            ),
            (ConfigLayerSource::User, options.user_config_path.as_deref()),
        ] {
            if let Some(path) = path {
                load_discovered_layer(source, path, &mut layers, &mut values, &mut seen_paths)?;
            }
        }

        let project_root = utils::find_project_root(&cwd, &options.project_root_markers);
        match project_root.as_ref() {
            Some(root) => debug!("resolved project root: {}", root.display()),
            None => debug!("project root not found; skipping project/repo layers"),
        }

        let mut local = Vec::new();
        if let Some(root) = project_root.as_ref() {
            local.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
        }
        local.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
        if let Some(root) = project_root.as_ref() {
            local.push((
                ConfigLayerSource::Repo,
                root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
            ));
        }
        for (source, path) in local {
            load_discovered_layer(source, &path, &mut layers, &mut values, &mut seen_paths)?;
        }

        for runtime_path in &options.runtime_paths {
            let (meta, value) =
                layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(meta);
            values.push(value);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for value in &values {
            merge::merge_json_values(&mut merged, value);
        }

        if let Some(endpoint) = options.endpoint_override {
            debug!("applying endpoint override from environment");
            merge::merge_json_values(
                &mut merged,
                &serde_json::json!({ "backend": { "endpoint": endpoint } }),
            );
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Environment,
                path: None,
            });
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decay.window_ms == 0 {
            return Err(ConfigError::Invalid(
                "decay.window_ms must be greater than zero".to_string(),
            ));
        }
        let map = &self.map;
        if map.min_zoom > map.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "map.min_zoom ({}) exceeds map.max_zoom ({})",
                map.min_zoom, map.max_zoom
            )));
        }
        if map.zoom < map.min_zoom || map.zoom > map.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "map.zoom ({}) outside [{}, {}]",
                map.zoom, map.min_zoom, map.max_zoom
            )));
        }
        if map.bounds.south >= map.bounds.north || map.bounds.west >= map.bounds.east {
            return Err(ConfigError::Invalid(
                "map.bounds must satisfy south < north and west < east".to_string(),
            ));
        }
        if self.ui.tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "ui.tick_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value, label: &str) -> Result<GardenConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: GardenConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// Load a discovered layer if it exists and has not been seen already.
fn load_discovered_layer(
    source: ConfigLayerSource,
    path: &Path,
    layers: &mut Vec<ConfigLayer>,
    values: &mut Vec<Value>,
    seen_paths: &mut HashSet<PathBuf>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!(
            "skipping missing layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    if !seen_paths.insert(utils::unique_path(path)) {
        debug!(
            "skipping duplicate layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    let (meta, value) = layer_io::load_required_layer(source, path)?;
    layers.push(meta);
    values.push(value);
    Ok(())
}
