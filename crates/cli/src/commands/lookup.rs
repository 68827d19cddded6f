//! Lookup command - find one channel by identity or primary address

use std::net::Ipv4Addr;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Result};
use chancfg_channel_core::{ChannelCfg, ChannelHandle, EngineConfig};
use serde::Serialize;

use super::load_manager;

#[derive(Serialize)]
struct Found {
    handle: ChannelHandle,
    #[serde(flatten)]
    channel: ChannelCfg,
}

/// Execute lookup command
pub fn execute(
    db: &Path,
    identity: Option<&str>,
    dest: Option<(Ipv4Addr, u16)>,
    config: &EngineConfig,
) -> Result<ExitCode> {
    let manager = load_manager(db, config)?;

    let found = match (identity, dest) {
        (Some(token), _) => manager.find_by_identity(token)?,
        (None, Some((addr, port))) => manager.lookup_primary(addr, port),
        (None, None) => bail!("Give either --identity or --addr and --port"),
    };

    match found {
        Some((handle, channel)) => {
            println!("{}", serde_json::to_string_pretty(&Found { handle, channel })?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No matching channel");
            Ok(ExitCode::FAILURE)
        }
    }
}
