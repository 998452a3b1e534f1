//! Effective configuration with full provenance
//!
//! The effective config captures the merged configuration plus
//! information about where each value came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use rstatus_model::TransitionPolicy;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Schema version for effective config output
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "rstatus/effective_config@1";

/// User config location, relative to the home directory
pub const USER_CONFIG_PATH: &str = ".config/rstatus/config.toml";

/// Project config location, relative to the working directory
pub const PROJECT_CONFIG_PATH: &str = ".rstatus.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Project,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Log output formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Human,
    Json,
}

/// Typed view of the settings the binary consumes
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_root: PathBuf,
    pub policy: TransitionPolicy,
    pub log_level: String,
    pub log_format: LogFormat,
    pub output: OutputFormat,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,

    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "access_key",
    "credential",
];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl EffectiveConfig {
    /// Default user config path, if a home directory is known
    pub fn user_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(USER_CONFIG_PATH))
    }

    /// Build effective config from layers. Missing files are skipped.
    pub fn build(
        user_config_path: Option<&Path>,
        project_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layers 2 and 3: user then project files
        for (origin, path) in [
            (ConfigOrigin::User, user_config_path),
            (ConfigOrigin::Project, project_config_path),
        ] {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        // Layer 4: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);
        let redactions = Self::redact_secrets(&mut merged);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
            redactions,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: TOML parse error: {}", path.display(), e))
        })?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Redact secrets in the config, returning list of redacted paths
    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        Self::redact_recursive(value, String::new(), &mut redactions);
        redactions
    }

    fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));
                    if is_secret && !val.is_object() && !val.is_array() {
                        *val = Value::String("[REDACTED]".to_string());
                        redactions.push(current_path);
                    } else {
                        Self::redact_recursive(val, current_path, redactions);
                    }
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    Self::redact_recursive(val, format!("{}[{}]", path, i), redactions);
                }
            }
            _ => {}
        }
    }

    /// Validate configuration values
    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        fn str_at<'a>(config: &'a Value, path: &str) -> Result<&'a str, ConfigError> {
            let mut current = config;
            for part in path.split('.') {
                current = current.get(part).ok_or_else(|| {
                    ConfigError::ValidationError(format!("{} is required", path))
                })?;
            }
            current.as_str().ok_or_else(|| {
                ConfigError::ValidationError(format!("{} must be a string", path))
            })
        }

        if str_at(config, "store.root")?.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.root must not be empty".to_string(),
            ));
        }

        let policy = str_at(config, "observe.policy")?;
        policy
            .parse::<TransitionPolicy>()
            .map_err(|e| ConfigError::ValidationError(format!("observe.policy: {}", e)))?;

        let level = str_at(config, "log.level")?;
        if !LOG_LEVELS.contains(&level) {
            return Err(ConfigError::ValidationError(format!(
                "log.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                level
            )));
        }

        let log_format = str_at(config, "log.format")?;
        if !matches!(log_format, "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "log.format must be pretty or json, got '{}'",
                log_format
            )));
        }

        let output = str_at(config, "output.format")?;
        if !matches!(output, "human" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be human or json, got '{}'",
                output
            )));
        }

        Ok(())
    }

    /// Typed settings. Only fails if the config was mutated after `build`.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let require = |path: &str| {
            self.get_str(path)
                .ok_or_else(|| ConfigError::ValidationError(format!("{} is required", path)))
        };
        let policy = require("observe.policy")?
            .parse::<TransitionPolicy>()
            .map_err(ConfigError::ValidationError)?;
        let log_format = match require("log.format")? {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let output = match require("output.format")? {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Human,
        };

        Ok(Settings {
            store_root: PathBuf::from(require("store.root")?),
            policy,
            log_level: require("log.level")?.to_string(),
            log_format,
            output,
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
