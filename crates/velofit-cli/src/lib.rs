//! VeloFit CLI
//!
//! Command-line front end for the VeloFit bike-fit analysis core. It reads a
//! pose sequence exported by a pose detector, runs the analysis and prints
//! the fit score with ranked adjustments.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a road position
//! velofit analyze --poses session.json --style road
//!
//! # Use rider measurements for the style and a saddle height estimate
//! velofit analyze --poses session.json --rider rider.json
//!
//! # Machine-readable output
//! velofit analyze --poses session.json --format json
//!
//! # Show the ideal ranges for a style
//! velofit profiles --style tt
//! ```

use clap::{Parser, Subcommand};

pub mod fit;

/// VeloFit Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "velofit")]
#[command(author, version, about = "Bike-fit analysis from side-view pose data")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log filter (e.g. "info", "velofit_core=debug"); overrides RUST_LOG
    #[arg(long, global = true, env = "VELOFIT_LOG")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a pose sequence and print the fit report
    Analyze(fit::AnalyzeArgs),

    /// List ideal ranges and weights per riding style
    Profiles(fit::ProfilesArgs),

    /// Display version information
    Version,
}
