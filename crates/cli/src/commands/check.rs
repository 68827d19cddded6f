//! Check command - validate every session of a document

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chancfg_channel_core::{split_sessions, ChannelRegistry, EngineConfig, RegistryCounters};
use colored::Colorize;
use tracing::info;

/// Execute check command
pub fn execute(file: &Path, config: &EngineConfig) -> Result<ExitCode> {
    let document = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    info!("Checking {}", file.display());

    let mut registry = ChannelRegistry::new(&config.registry);
    let mut failed = 0;
    for (index, text) in split_sessions(&document).iter().enumerate() {
        match registry.add_text(text) {
            Ok(handle) => {
                if let Some(channel) = registry.get_any(handle) {
                    println!(
                        "{} session {}: {} version {} ({} / {}){}",
                        "ok".green(),
                        index,
                        channel.key,
                        channel.version,
                        channel.role,
                        channel.mode,
                        if channel.active { "" } else { " inactive" }
                    );
                }
            }
            Err(err) => {
                failed += 1;
                println!("{} session {}: {}", "FAIL".red().bold(), index, err);
            }
        }
    }

    print_counters(registry.counters());
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_counters(counters: &RegistryCounters) {
    println!();
    println!("Sessions seen:        {}", counters.sessions_seen);
    println!("Parsed:               {}", counters.sessions_parsed);
    println!("Syntax errors:        {}", counters.syntax_errors);
    println!("Validated:            {}", counters.sessions_validated);
    println!("Validation errors:    {}", counters.validation_errors);
    println!("Registry conflicts:   {}", counters.registry_conflicts);
}
