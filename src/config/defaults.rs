//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Record store directory (default: ".rstatus/store")
    pub store_root: String,

    /// Transition policy for observations (default: "strict")
    pub observe_policy: String,

    /// Log level filter (default: "info")
    pub log_level: String,

    /// Log formatter (default: "pretty")
    pub log_format: String,

    /// CLI output format (default: "human")
    pub output_format: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            store_root: ".rstatus/store".to_string(),
            observe_policy: "strict".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            output_format: "human".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "store": {
                "root": self.store_root
            },
            "observe": {
                "policy": self.observe_policy
            },
            "log": {
                "level": self.log_level,
                "format": self.log_format
            },
            "output": {
                "format": self.output_format
            }
        })
    }
}
