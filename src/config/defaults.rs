//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::filter::DEFAULT_RESERVED_PATTERNS;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Reserved tag key patterns (default: ["^aws:"])
    pub reserved_prefix_patterns: Vec<String>,

    /// Tag store file used by the CLI (default: ".tagsync/store.json")
    pub store_path: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            reserved_prefix_patterns: DEFAULT_RESERVED_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            store_path: ".tagsync/store.json".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "reserved_prefix_patterns": self.reserved_prefix_patterns,
            "store": {
                "path": self.store_path
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.reserved_prefix_patterns, vec!["^aws:".to_string()]);
        assert_eq!(defaults.store_path, ".tagsync/store.json");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["reserved_prefix_patterns"][0], "^aws:");
        assert_eq!(value["store"]["path"], ".tagsync/store.json");
    }
}
