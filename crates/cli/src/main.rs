//! Main entry point for the chancfg command-line tool
//!
//! Checks channel documents, inspects persisted configurations and
//! applies updates through the same protocol the engine uses at runtime.

mod commands;
mod config;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chancfg_channel_core::setup_logging;
use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser, Debug)]
#[command(name = "chancfg", version, about = "Multicast channel configuration tool")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "CHANCFG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every session of a document
    Check {
        /// Channel document
        file: PathBuf,
    },

    /// List the channels of a persisted configuration
    Show {
        db: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one channel
    Lookup {
        db: PathBuf,

        /// Session identity, `o=<user> <id> <version> IN IP4 <addr>`
        #[arg(long, conflicts_with_all = ["addr", "port"])]
        identity: Option<String>,

        /// Primary or FEC multicast address
        #[arg(long, requires = "port")]
        addr: Option<Ipv4Addr>,

        #[arg(long, requires = "addr")]
        port: Option<u16>,
    },

    /// Apply a candidate document to a live configuration
    Update {
        live: PathBuf,
        candidate: PathBuf,

        /// Write the committed configuration back to the live file
        #[arg(long)]
        write: bool,
    },

    /// Print the canonical rendering of a configuration
    Render { db: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    setup_logging(&config.logging)?;

    match cli.command {
        Commands::Check { file } => commands::check::execute(&file, &config),
        Commands::Show { db, json } => commands::show::execute(&db, json, &config),
        Commands::Lookup {
            db,
            identity,
            addr,
            port,
        } => commands::lookup::execute(&db, identity.as_deref(), addr.zip(port), &config),
        Commands::Update {
            live,
            candidate,
            write,
        } => commands::update::execute(&live, &candidate, write, &config),
        Commands::Render { db } => commands::render::execute(&db, &config),
    }
}
