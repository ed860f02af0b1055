//! Configuration merge system
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Host/user config (~/.config/tagsync/config.toml)
//! 3. Repo config (.tagsync.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, Settings, StoreSettings,
};
pub use merge::{deep_merge, merge_layers};

use std::path::PathBuf;

/// Default repo config location, relative to the working directory
pub const REPO_CONFIG_PATH: &str = ".tagsync.toml";

/// Host config location (~/.config/tagsync/config.toml), if HOME is set
pub fn host_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("tagsync")
            .join("config.toml")
    })
}
