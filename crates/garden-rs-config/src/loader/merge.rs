//! JSON merge for layered configuration.

use serde_json::Value;

/// Merge `overlay` into `base`: objects merge key by key, anything else
/// (scalars, arrays, type changes) is replaced wholesale.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, replacement) => *slot = replacement.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let mut base = json!({ "map": { "zoom": 2, "center": { "lat": 20 } }, "ui": { "tick_ms": 250 } });
        merge_json_values(
            &mut base,
            &json!({ "map": { "center": { "lng": 5 } }, "ui": { "tick_ms": 100 } }),
        );
        assert_eq!(
            base,
            json!({ "map": { "zoom": 2, "center": { "lat": 20, "lng": 5 } }, "ui": { "tick_ms": 100 } })
        );
    }

    #[test]
    fn type_change_replaces_value() {
        let mut base = json!({ "backend": { "endpoint": "a" } });
        merge_json_values(&mut base, &json!({ "backend": null }));
        assert_eq!(base, json!({ "backend": null }));
    }
}
