//! Configuration models and layered config loading.
//!
//! This crate owns the garden config schema, validation, and the
//! layer-merging logic shared by the CLI and the terminal map.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{
    ConfigLayer, ConfigLayerSource, ENV_ENDPOINT, LayeredConfig, LayeredConfigOptions,
};
/// Configuration schema models.
pub use model::*;
