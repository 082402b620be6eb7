//! Public surface for the memory garden.
//!
//! This crate re-exports the building blocks and provides the startup
//! helpers shared by the `garden` binary.

/// Re-export for convenience.
pub use garden_rs_config as config;
pub use garden_rs_core as core;
/// Re-export for convenience.
pub use garden_rs_protocol as protocol;
pub use garden_rs_tui as tui;

use anyhow::Context;
use garden_rs_config::{GardenConfig, LayeredConfigOptions};
use garden_rs_core::{Garden, GardenContext, MarkerView};
use log::{debug, info};
use std::path::Path;

/// Initialize logging with millisecond timestamps, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

/// Load the layered config from `cwd`, with an optional runtime file and
/// endpoint override applied last.
pub fn load_config(
    cwd: &Path,
    runtime: Option<&Path>,
    endpoint: Option<&str>,
) -> anyhow::Result<GardenConfig> {
    let mut options = LayeredConfigOptions::new(cwd);
    if let Some(path) = runtime {
        info!("loading runtime config (path={})", path.display());
        options = options.with_runtime_path(path);
    }
    if let Some(endpoint) = endpoint {
        options = options.with_endpoint(endpoint);
    }
    let layered = GardenConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

/// Build a garden backed by the HTTP record store named in `config`.
pub fn open_garden(config: GardenConfig) -> anyhow::Result<Garden> {
    let context = GardenContext::from_config(config).context("failed to open record store")?;
    Ok(Garden::new(context))
}

/// One line of `garden list` output.
pub fn marker_line(marker: &MarkerView) -> String {
    let opacity = if marker.is_visible() {
        format!("{:>3.0}%", marker.render_opacity() * 100.0)
    } else {
        "gone".to_string()
    };
    let title = if marker.popup.title.is_empty() {
        "(untitled)"
    } else {
        marker.popup.title.as_str()
    };
    format!(
        "{}  {}  {}  {}  {}",
        marker.id, marker.position, marker.asset, opacity, title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_rs_core::Popup;
    use garden_rs_protocol::{IconId, Position, RecordId};
    use pretty_assertions::assert_eq;

    fn marker(title: &str, opacity: f64) -> MarkerView {
        MarkerView {
            id: RecordId::new("2025-03-01T10:00:00.000Z"),
            position: Position::new(1.5, -2.0),
            icon: IconId::Two,
            asset: "2.small.png".to_string(),
            opacity,
            popup: Popup {
                title: title.to_string(),
                created: String::new(),
                body: String::new(),
            },
        }
    }

    #[test]
    fn marker_line_shows_percentage() {
        let line = marker_line(&marker("Picnic", 0.5));
        assert!(line.starts_with("2025-03-01T10:00:00.000Z  "));
        assert!(line.contains("2.small.png   50%  Picnic"));
    }

    #[test]
    fn faded_marker_is_gone() {
        let line = marker_line(&marker("", -0.25));
        assert!(line.ends_with("gone  (untitled)"));
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let err = open_garden(GardenConfig::default())
            .err()
            .expect("no endpoint");
        assert_eq!(err.to_string(), "failed to open record store");
    }
}
