//! Render command - print the canonical form of a configuration

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use chancfg_channel_core::EngineConfig;

use super::load_manager;

/// Execute render command
pub fn execute(db: &Path, config: &EngineConfig) -> Result<ExitCode> {
    let manager = load_manager(db, config)?;
    print!("{}", manager.render());
    Ok(ExitCode::SUCCESS)
}
