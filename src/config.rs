//! Configuration file discovery and loading.

pub use mg_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Locations searched, in order, when no path is given.
pub const DEFAULT_PATHS: [&str; 3] = [
    "./mediagate.toml",
    "~/.config/mediagate/config.toml",
    "/etc/mediagate/config.toml",
];

/// Load configuration from a TOML file, failing on anything invalid.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("{}: {warning}", path.display());
    }

    Ok(config)
}

/// Load config from `custom_path`, else the first default location that
/// exists, else defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}
