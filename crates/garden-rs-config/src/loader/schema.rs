//! Schema validation helpers for garden JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
///
/// Every layer is checked on its own so that an error names the file it
/// came from; all fields are optional at this level.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "backend", "decay", "map", "assets", "ui"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("backend") {
        validate_backend(value, layer, "backend")?;
    }
    if let Some(value) = map.get("decay") {
        validate_decay(value, layer, "decay")?;
    }
    if let Some(value) = map.get("map") {
        validate_map(value, layer, "map")?;
    }
    if let Some(value) = map.get("assets") {
        let assets = expect_object(value, layer, "assets")?;
        ensure_allowed_keys(assets, &["base"], layer, "assets")?;
        if let Some(value) = assets.get("base") {
            expect_string(value, layer, "assets.base")?;
        }
    }
    if let Some(value) = map.get("ui") {
        validate_ui(value, layer, "ui")?;
    }
    Ok(())
}

/// Validate the "backend" block.
fn validate_backend(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["endpoint", "user_agent"], layer, path)?;
    if let Some(value) = map.get("endpoint") {
        let endpoint_path = join_path(path, "endpoint");
        let endpoint = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &endpoint_path, "expected string"))?;
        if !endpoint.is_empty()
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(invalid_field(
                layer,
                &endpoint_path,
                "expected an http(s) URL",
            ));
        }
    }
    if let Some(value) = map.get("user_agent") {
        expect_string(value, layer, &join_path(path, "user_agent"))?;
    }
    Ok(())
}

/// Validate the "decay" block.
fn validate_decay(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["window_ms"], layer, path)?;
    if let Some(value) = map.get("window_ms") {
        expect_u64(value, layer, &join_path(path, "window_ms"))?;
    }
    Ok(())
}

/// Validate the "map" block.
fn validate_map(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["center", "zoom", "min_zoom", "max_zoom", "bounds"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("center") {
        let center_path = join_path(path, "center");
        let center = expect_object(value, layer, &center_path)?;
        ensure_allowed_keys(center, &["lat", "lng"], layer, &center_path)?;
        for key in ["lat", "lng"] {
            if let Some(value) = center.get(key) {
                expect_f64(value, layer, &join_path(&center_path, key))?;
            }
        }
    }
    for key in ["zoom", "min_zoom", "max_zoom"] {
        if let Some(value) = map.get(key) {
            expect_zoom(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("bounds") {
        let bounds_path = join_path(path, "bounds");
        let bounds = expect_object(value, layer, &bounds_path)?;
        let sides = ["south", "north", "west", "east"];
        ensure_allowed_keys(bounds, &sides, layer, &bounds_path)?;
        for key in sides {
            if let Some(value) = bounds.get(key) {
                expect_f64(value, layer, &join_path(&bounds_path, key))?;
            }
        }
    }
    Ok(())
}

/// Validate the "ui" block.
fn validate_ui(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["tick_ms", "close_form_after_ms"], layer, path)?;
    for key in ["tick_ms", "close_form_after_ms"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a non-negative integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Expect a zoom level that fits in a byte.
fn expect_zoom(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_u64() {
        Some(zoom) if zoom <= u64::from(u8::MAX) => Ok(()),
        _ => Err(invalid_field(layer, path, "expected zoom level 0-255")),
    }
}

/// Expect any JSON number.
fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
