pub mod schema;

pub use schema::DispatcherConfig;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default dispatcher home directory (~/.tool-dispatcher).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".tool-dispatcher"))
        .unwrap_or_else(|| PathBuf::from(".tool-dispatcher"))
}

/// Default config file location inside the home directory.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("dispatcher.toml")
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<DispatcherConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read dispatcher config file")?;
        let config: DispatcherConfig =
            toml::from_str(&contents).context("Failed to parse dispatcher config (TOML)")?;
        Ok(config)
    } else {
        Ok(DispatcherConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &DispatcherConfig, path: &Path) -> Result<()> {
    config.validate()?;
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}
