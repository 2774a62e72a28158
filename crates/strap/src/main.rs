//! strap - install a bootstrap environment archive.

use anyhow::{Context, Result};
use clap::Parser;
use strap_install::InstallConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config =
        InstallConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Install {
            archive,
            sha256,
            retries,
            skip_hooks,
        } => commands::install(config, &archive, sha256, retries, skip_hooks),
        Commands::Status => commands::status(&config),
        Commands::Storage => commands::storage(&config),
        Commands::Config => commands::print_config(&config),
    }
}
