//! Show command - list the channels of a configuration

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use chancfg_channel_core::{ChannelCfg, EngineConfig};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::load_manager;

#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "Handle")]
    handle: String,
    #[tabled(rename = "Session")]
    key: String,
    #[tabled(rename = "Version")]
    version: u64,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Primary")]
    primary: String,
    #[tabled(rename = "Active")]
    active: bool,
}

/// Execute show command
pub fn execute(db: &Path, json: bool, config: &EngineConfig) -> Result<ExitCode> {
    let manager = load_manager(db, config)?;
    let snapshot = manager.snapshot();

    if json {
        let channels: Vec<&ChannelCfg> = snapshot.channels().map(|(_, channel)| channel).collect();
        println!("{}", serde_json::to_string_pretty(&channels)?);
        return Ok(ExitCode::SUCCESS);
    }

    let rows: Vec<ChannelRow> = snapshot
        .channels()
        .map(|(handle, channel)| {
            let (addr, port) = channel.primary_dest();
            ChannelRow {
                handle: handle.to_string(),
                key: channel.key.to_string(),
                version: channel.version,
                role: channel.role.to_string(),
                mode: channel.mode.to_string(),
                primary: format!("{}:{}", addr, port),
                active: channel.active,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!("{} channels", snapshot.len());
    Ok(ExitCode::SUCCESS)
}
