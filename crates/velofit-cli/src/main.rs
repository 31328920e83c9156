//! VeloFit CLI Entry Point
//!
//! This is the main entry point for the velofit command-line tool.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use velofit_cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Analyze(args) => velofit_cli::fit::execute_analyze(args)?,
        Commands::Profiles(args) => velofit_cli::fit::execute_profiles(args)?,
        Commands::Version => {
            println!("velofit {}", env!("CARGO_PKG_VERSION"));
            println!("Core library version: {}", velofit_core::VERSION);
            println!(
                "Profile schema version: {}",
                velofit_core::profile::PROFILE_SCHEMA_VERSION
            );
        }
    }

    Ok(())
}
