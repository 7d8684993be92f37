//! Configuration management for tribute.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::countdown::{AnniversaryDate, DEFAULT_DAY, DEFAULT_MONTH};
use crate::dust::{Palette, DEFAULT_COLORS};
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "tribute";

/// Prefix for environment overrides, e.g. `TRIBUTE_DUST__BURST_SIZE=20`.
const ENV_PREFIX: &str = "TRIBUTE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRIBUTE_`, sections split on `__`)
/// 2. TOML config file at `~/.config/tribute/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown configuration.
    pub countdown: CountdownConfig,
    /// Dust effect configuration.
    pub dust: DustConfig,
}

/// Countdown-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Anniversary month (1-12).
    pub month: u32,
    /// Anniversary day of month.
    pub day: u32,
    /// Interval between recomputations in milliseconds.
    pub tick_interval_ms: u64,
}

/// Dust-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustConfig {
    /// How long a session keeps spawning, in milliseconds.
    pub session_ms: u64,
    /// Time between bursts in milliseconds.
    pub burst_interval_ms: u64,
    /// Particles per burst.
    pub burst_size: usize,
    /// Smallest particle diameter in pixels.
    pub min_size: f64,
    /// Largest particle diameter in pixels.
    pub max_size: f64,
    /// Smallest rise in viewport-height percent.
    pub min_rise_vh: f64,
    /// Largest rise in viewport-height percent.
    pub max_rise_vh: f64,
    /// Largest horizontal drift either way, in pixels.
    pub max_drift_px: f64,
    /// Shortest particle lifetime in milliseconds.
    pub min_lifetime_ms: u64,
    /// Longest particle lifetime in milliseconds.
    pub max_lifetime_ms: u64,
    /// Particle colors as `#RRGGBB`.
    pub palette: Vec<String>,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            month: DEFAULT_MONTH,
            day: DEFAULT_DAY,
            tick_interval_ms: 1_000,
        }
    }
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            session_ms: 3_000,
            burst_interval_ms: 50,
            burst_size: 10,
            min_size: 1.0,
            max_size: 5.0,
            min_rise_vh: 120.0,
            max_rise_vh: 220.0,
            max_drift_px: 150.0,
            min_lifetime_ms: 2_000,
            max_lifetime_ms: 4_000,
            palette: DEFAULT_COLORS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl CountdownConfig {
    /// The configured anniversary, if the month/day exists.
    #[must_use]
    pub fn anniversary(&self) -> Option<AnniversaryDate> {
        AnniversaryDate::new(self.month, self.day)
    }

    /// Get the tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl DustConfig {
    /// Get the session length as a Duration.
    #[must_use]
    pub fn session(&self) -> Duration {
        Duration::from_millis(self.session_ms)
    }

    /// Get the burst interval as a Duration.
    #[must_use]
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }

    /// Get the longest particle lifetime as a Duration.
    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(&config_file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let countdown = &self.countdown;
        if countdown.anniversary().is_none() {
            return Err(Error::config_validation(format!(
                "countdown date {:02}-{:02} does not exist",
                countdown.month, countdown.day
            )));
        }
        if countdown.tick_interval_ms == 0 {
            return Err(Error::config_validation(
                "tick_interval_ms must be greater than 0",
            ));
        }

        let dust = &self.dust;
        if dust.session_ms == 0 {
            return Err(Error::config_validation("session_ms must be greater than 0"));
        }
        if dust.burst_interval_ms == 0 {
            return Err(Error::config_validation(
                "burst_interval_ms must be greater than 0",
            ));
        }
        if dust.burst_size == 0 {
            return Err(Error::config_validation("burst_size must be greater than 0"));
        }

        check_range("size", dust.min_size, dust.max_size)?;
        check_range("rise_vh", dust.min_rise_vh, dust.max_rise_vh)?;
        // Drift is sampled over [-max, max], so the full width must stay finite.
        if !(2.0 * dust.max_drift_px).is_finite() || dust.max_drift_px < 0.0 {
            return Err(Error::config_validation(
                "max_drift_px must be a non-negative number",
            ));
        }
        if dust.min_lifetime_ms > dust.max_lifetime_ms {
            return Err(Error::config_validation(format!(
                "min_lifetime_ms ({}) cannot be greater than max_lifetime_ms ({})",
                dust.min_lifetime_ms, dust.max_lifetime_ms
            )));
        }

        Palette::parse(&dust.palette)?;
        Ok(())
    }
}

/// Check a `min_<name>` / `max_<name>` pair is finite, non-negative and ordered.
fn check_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(Error::config_validation(format!(
            "min_{name} and max_{name} must be non-negative numbers"
        )));
    }
    if min > max {
        return Err(Error::config_validation(format!(
            "min_{name} ({min}) cannot be greater than max_{name} ({max})"
        )));
    }
    Ok(())
}
