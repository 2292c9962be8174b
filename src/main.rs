use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nuriwake::cli::{Cli, Commands};
use nuriwake::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match &cli.command {
        Commands::Join(args) => commands::join(&cli, args),
        Commands::Bins(args) => commands::bins(&cli, args),
        Commands::Layer(args) => commands::layer(&cli, args),
        Commands::View(args) => commands::view(&cli, args),
    }
}
