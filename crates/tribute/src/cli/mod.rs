//! Command-line interface for tribute.
//!
//! This module provides the CLI structure for the `tribute` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, CountdownCommand, DustCommand};
pub use output::{write_config, write_countdown, write_dust_summary, DustSummary};

use crate::logging::Verbosity;

/// tribute - The milestone clock and celestial dust
///
/// Counts down to the next anniversary and plays the dust effect against an
/// in-memory surface.
#[derive(Debug, Parser)]
#[command(name = "tribute")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the time remaining until the anniversary
    Countdown(CountdownCommand),

    /// Trigger dust sessions and summarise what they drew
    Dust(DustCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
