// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemos - stateful agents with tiered memory.
//!
//! This is the binary entry point for the Mnemos service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mnemos_config::MnemosConfig;

/// Mnemos - stateful agents with tiered memory.
#[derive(Parser, Debug)]
#[command(name = "mnemos", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service.
    Serve,
    /// Inspect Mnemos configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration with secrets redacted.
    Show,
    /// Load and validate configuration, then exit.
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mnemos_config::load_and_validate_path(path),
        None => mnemos_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mnemos_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => match toml::to_string_pretty(&redacted(config)) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render configuration: {e}");
                    std::process::exit(1);
                }
            },
            ConfigAction::Validate => {
                println!("mnemos: configuration is valid (agent.name={})", config.agent.name);
            }
        },
        None => {
            println!("mnemos: use --help for available commands");
        }
    }
}

/// Replaces API keys with a placeholder.
fn redacted(mut config: MnemosConfig) -> MnemosConfig {
    const MASK: &str = "[redacted]";
    if config.anthropic.api_key.is_some() {
        config.anthropic.api_key = Some(MASK.to_string());
    }
    if config.openai.api_key.is_some() {
        config.openai.api_key = Some(MASK.to_string());
    }
    config
}
