// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use keg_relocate::config::load_locations;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let load = || {
        load_locations(cli.config.as_deref(), &cli.locations.overrides())
            .context("Failed to load install locations")
    };

    match &cli.command {
        Commands::Freeze { keg, json } => commands::cmd_freeze(load()?, keg, *json),
        Commands::Thaw {
            keg,
            files,
            skip_linkage,
            json,
        } => commands::cmd_thaw(load()?, keg, files.clone(), *skip_linkage, *json),
        Commands::Relativize { keg } => commands::cmd_relativize(load()?, keg),
        Commands::TextFiles { keg } => commands::cmd_text_files(load()?, keg),
        Commands::Grep { keg, needle } => commands::cmd_grep(keg, needle),
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "keg-relocate",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
