//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Countdown command arguments.
#[derive(Debug, Args)]
pub struct CountdownCommand {
    /// Count from this local instant instead of now (e.g. "2026-01-30T00:00:00")
    #[arg(long, value_name = "INSTANT")]
    pub at: Option<String>,

    /// Print the remaining time once and exit
    #[arg(long)]
    pub once: bool,

    /// Stop after this many ticks (live mode only)
    #[arg(short = 'n', long, value_name = "N")]
    pub ticks: Option<u64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dust command arguments.
#[derive(Debug, Args)]
pub struct DustCommand {
    /// Number of sessions to trigger
    #[arg(short, long, default_value = "1")]
    pub triggers: u32,

    /// Delay between consecutive triggers in milliseconds
    #[arg(long, default_value = "0", value_name = "MS")]
    pub stagger_ms: u64,

    /// Seed for reproducible particles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate (defaults to standard location)
        file: Option<PathBuf>,
    },
}
