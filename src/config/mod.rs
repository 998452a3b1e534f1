//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. User config (~/.config/rstatus/config.toml)
//! 3. Project config (.rstatus.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, LogFormat, OutputFormat, Settings,
    PROJECT_CONFIG_PATH, USER_CONFIG_PATH,
};
pub use merge::{deep_merge, merge_layers, overlay_from_pairs};
