//! Layer merging
//!
//! Objects merge key by key; arrays and scalars from the later layer replace
//! the earlier value outright. A pattern list set in the repo config
//! therefore replaces the built-in list rather than extending it.

use serde_json::Value;

/// Merge `overlay` on top of `base`.
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
        (_, overlay) => overlay,
    }
}

/// Merge layers in order; the last layer has the highest precedence
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_list_replaced() {
        let base = json!({"reserved_prefix_patterns": ["^aws:"]});
        let overlay = json!({"reserved_prefix_patterns": ["^aws:", "^gcp-"]});

        let result = deep_merge(base, overlay);

        assert_eq!(result["reserved_prefix_patterns"], json!(["^aws:", "^gcp-"]));
    }

    #[test]
    fn test_empty_list_clears_patterns() {
        let base = json!({"reserved_prefix_patterns": ["^aws:"]});
        let overlay = json!({"reserved_prefix_patterns": []});

        let result = deep_merge(base, overlay);

        assert_eq!(result["reserved_prefix_patterns"], json!([]));
    }

    #[test]
    fn test_nested_table_merge() {
        let base = json!({"store": {"path": "a.json", "extra": true}});
        let overlay = json!({"store": {"path": "b.json"}});

        let result = deep_merge(base, overlay);

        assert_eq!(result["store"]["path"], "b.json");
        assert_eq!(result["store"]["extra"], true);
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({
            "reserved_prefix_patterns": ["^aws:"],
            "store": {"path": ".tagsync/store.json"}
        });
        let host = json!({"store": {"path": "/var/lib/tagsync.json"}});
        let repo = json!({"reserved_prefix_patterns": ["^aws:", "^team/"]});
        let cli = json!({"store": {"path": "cli.json"}});

        let result = merge_layers(vec![builtin, host, repo, cli]);

        assert_eq!(result["store"]["path"], "cli.json");
        assert_eq!(result["reserved_prefix_patterns"][1], "^team/");
    }

    #[test]
    fn test_merge_no_layers() {
        assert!(merge_layers(vec![]).is_null());
    }
}
