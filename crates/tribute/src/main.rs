//! `tribute` - CLI for the milestone clock and celestial dust
//!
//! This binary previews the countdown from any instant and runs dust sessions
//! against an in-memory surface, printing what they drew.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::time::Instant;
use tracing::{debug, info};

use tribute::cli::{
    write_config, write_countdown, write_dust_summary, Cli, Command, ConfigCommand,
    CountdownCommand, DustCommand, DustSummary,
};
use tribute::countdown::parse_instant;
use tribute::dust::RecordingSurface;
use tribute::{
    init_logging, Config, CountdownClock, DustGenerator, LocalTime, SimulatedTime, TimeSource,
};

/// Extra time allowed for removal timers to run after the longest lifetime.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Configuration is loaded per command so `config validate` can check a
    // file even when the default one is broken.
    let config_path = cli.config;
    match cli.command {
        Command::Countdown(cmd) => handle_countdown(&load_config(config_path)?, &cmd).await,
        Command::Dust(cmd) => handle_dust(&load_config(config_path)?, &cmd).await,
        Command::Config(cmd) => handle_config(config_path, cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("loading configuration")
}

async fn handle_countdown(config: &Config, cmd: &CountdownCommand) -> anyhow::Result<()> {
    let origin = cmd.at.as_deref().map(parse_instant).transpose()?;

    if cmd.once {
        let date = config.countdown.anniversary().unwrap_or_default();
        let now = origin.unwrap_or_else(|| LocalTime.now());
        write_countdown(&mut io::stdout().lock(), date.compute_remaining(now), cmd.json)?;
        return Ok(());
    }

    let clock = match origin {
        Some(origin) => {
            CountdownClock::from_config(&config.countdown, SimulatedTime::starting_at(origin))
        }
        None => CountdownClock::from_config(&config.countdown, LocalTime),
    };
    info!(date = %clock.date(), "counting down");

    let mut rx = clock.subscribe();
    let mut printed = 0u64;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let remaining = *rx.borrow_and_update();
                write_countdown(&mut io::stdout().lock(), remaining, cmd.json)?;
                printed += 1;
                if cmd.ticks.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        }
    }

    clock.stop();
    Ok(())
}

async fn handle_dust(config: &Config, cmd: &DustCommand) -> anyhow::Result<()> {
    let generator = DustGenerator::from_config(RecordingSurface::new(), &config.dust, cmd.seed)?;
    let timing = generator.timing();
    let stagger = Duration::from_millis(cmd.stagger_ms);

    for i in 0..cmd.triggers {
        if i > 0 {
            tokio::time::sleep(stagger).await;
        }
        generator.trigger();
    }

    // Spawning ends one session length after the last trigger.
    tokio::time::sleep(timing.duration + timing.effective_interval()).await;

    let deadline = Instant::now() + config.dust.max_lifetime() + DRAIN_GRACE;
    while generator.surface().alive() > 0 && Instant::now() < deadline {
        tokio::time::sleep(timing.effective_interval()).await;
    }

    let sessions = generator.sessions_started();
    let summary = DustSummary {
        sessions,
        expected_particles: sessions * timing.expected_particles(),
        surface: generator.surface().stats(),
    };
    write_dust_summary(&mut io::stdout().lock(), &summary, cmd.json)?;
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            write_config(&mut io::stdout().lock(), &config, json)?;
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("{} is not a valid configuration", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tribute_test_{}_{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_validate_invalid_file_is_error() {
        let bad = write_temp_config("bad_date", "[countdown]\nmonth = 4\nday = 31\n");

        let result = handle_config(None, ConfigCommand::Validate { file: Some(bad.clone()) });
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("not a valid configuration"));
        assert!(err.contains("04-31"));

        let _ = std::fs::remove_file(bad);
    }

    #[test]
    fn test_validate_ignores_broken_global_config() {
        let broken = write_temp_config("broken_global", "[dust]\nburst_size = 0\n");
        let good = write_temp_config("good", "[countdown]\nmonth = 6\nday = 15\n");

        let result = handle_config(
            Some(broken.clone()),
            ConfigCommand::Validate {
                file: Some(good.clone()),
            },
        );
        assert!(result.is_ok());

        // Without an explicit file the global one is what gets checked.
        let result = handle_config(Some(broken.clone()), ConfigCommand::Validate { file: None });
        assert!(result.is_err());

        let _ = std::fs::remove_file(broken);
        let _ = std::fs::remove_file(good);
    }

    #[test]
    fn test_show_reports_broken_config() {
        let broken = write_temp_config("broken_show", "[dust]\nburst_interval_ms = 0\n");
        let result = handle_config(Some(broken.clone()), ConfigCommand::Show { json: true });
        assert!(result.is_err());
        let _ = std::fs::remove_file(broken);
    }
}
