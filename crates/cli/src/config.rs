//! Configuration file loading

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chancfg_channel_core::EngineConfig;

/// `<config dir>/chancfg/config.toml`
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chancfg").join("config.toml"))
}

/// Load the configuration from `path`, else from the default location if
/// a file exists there, else use the built-in defaults.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => return Ok(EngineConfig::default()),
        },
    };
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

fn parse(text: &str) -> Result<EngineConfig> {
    Ok(toml::from_str(text)?)
}
