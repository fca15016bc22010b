mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./ismforge.toml", "~/.config/ismforge/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.processing.worker_threads == Some(0) {
        anyhow::bail!("processing.worker_threads cannot be 0");
    }

    if let Some(name) = &config.manifest.name {
        if name.is_empty() {
            anyhow::bail!("manifest.name cannot be empty");
        }
        if name.contains(['/', '\\']) {
            anyhow::bail!("manifest.name '{}' must not contain a path separator", name);
        }
    }

    if !config.storage.container.exists() {
        tracing::warn!("Storage container does not exist: {:?}", config.storage.container);
    }

    Ok(())
}
