//! Configuration merge logic
//!
//! Layers merge with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::{Map, Value};

/// Deep merge two JSON values, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays and scalars: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Build an overlay from dotted `key=value` pairs, as given on the command
/// line. Values are taken as strings.
pub fn overlay_from_pairs<'a, I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut root = Value::Object(Map::new());
    for (path, value) in pairs {
        let mut overlay = Value::String(value.to_string());
        for key in path.rsplit('.') {
            let mut map = Map::new();
            map.insert(key.to_string(), overlay);
            overlay = Value::Object(map);
        }
        root = deep_merge(root, overlay);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"observe": {"policy": "strict"}}), json!({"observe": {"policy": "absorbing"}}));
        assert_eq!(result["observe"]["policy"], "absorbing");
    }

    #[test]
    fn test_object_deep_merge_keeps_siblings() {
        let base = json!({"log": {"level": "info", "format": "pretty"}});
        let overlay = json!({"log": {"level": "debug"}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["log"]["level"], "debug");
        assert_eq!(result["log"]["format"], "pretty");
    }

    #[test]
    fn test_array_replace() {
        let base = json!({"kinds": ["job", "endpoint"]});
        let overlay = json!({"kinds": ["capacity_interval"]});
        let result = deep_merge(base, overlay);

        assert_eq!(result["kinds"], json!(["capacity_interval"]));
    }

    #[test]
    fn test_null_override() {
        let result = deep_merge(json!({"store": {"root": "/tmp"}}), json!({"store": null}));
        assert!(result["store"].is_null());
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"store": {"root": "a"}, "log": {"level": "info"}});
        let user = json!({"store": {"root": "b"}});
        let project = json!({"log": {"level": "warn"}});
        let cli = json!({"store": {"root": "c"}});

        let result = merge_layers(vec![builtin, user, project, cli]);

        assert_eq!(result["store"]["root"], "c");
        assert_eq!(result["log"]["level"], "warn");
    }

    #[test]
    fn test_overlay_from_pairs() {
        let overlay = overlay_from_pairs([("store.root", "/var/lib/rstatus"), ("log.level", "debug"), ("log.format", "json")]);
        assert_eq!(
            overlay,
            json!({
                "store": {"root": "/var/lib/rstatus"},
                "log": {"level": "debug", "format": "json"}
            })
        );
    }
}
