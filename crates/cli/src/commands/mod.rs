//! One module per subcommand, each with an `execute` entry point

pub mod check;
pub mod lookup;
pub mod render;
pub mod show;
pub mod update;

use std::path::Path;

use anyhow::{Context, Result};
use chancfg_channel_core::{ChannelManager, EngineConfig};

/// Manager loaded from a persisted configuration file
pub(crate) fn load_manager(db: &Path, config: &EngineConfig) -> Result<ChannelManager> {
    let manager = ChannelManager::new(config.registry.clone());
    manager
        .load_file(db)
        .with_context(|| format!("Failed to load {}", db.display()))?;
    Ok(manager)
}
