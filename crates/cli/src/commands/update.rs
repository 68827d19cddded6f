//! Update command - apply a candidate document to a live configuration

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chancfg_channel_core::{EngineConfig, UpdateError, UpdateReport};
use colored::Colorize;
use tracing::info;

use super::load_manager;

/// Execute update command
pub fn execute(live: &Path, candidate: &Path, write: bool, config: &EngineConfig) -> Result<ExitCode> {
    let manager = load_manager(live, config)?;
    let document = fs::read_to_string(candidate)
        .with_context(|| format!("Failed to read {}", candidate.display()))?;

    match manager.apply_document(&document) {
        Ok(report) => {
            println!("{} {}", "committed:".green().bold(), report);
            if write {
                manager
                    .save_file(live)
                    .with_context(|| format!("Failed to write {}", live.display()))?;
                info!("Wrote {}", live.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(UpdateError::Rejected(report)) => {
            println!("{} {}", "rejected:".red().bold(), report);
            print_failures(&report);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn print_failures(report: &UpdateReport) {
    for failure in &report.failures {
        println!(
            "  session {} ({}): {}",
            failure.index,
            failure.key.as_deref().unwrap_or("no identity"),
            failure.reason
        );
    }
}
