//! Dust particle parameters and sampling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::DustConfig;
use crate::error::{Error, Result};

/// The gold-and-ivory palette particles are drawn from.
pub const DEFAULT_COLORS: [Color; 4] = [
    Color::rgb(0xD4, 0xAF, 0x37),
    Color::rgb(0xFD, 0xFC, 0xFB),
    Color::rgb(0xB8, 0x86, 0x0B),
    Color::rgb(0xE5, 0xE7, 0xEB),
];

/// Particles start this far below the bottom edge of the viewport.
pub const START_BOTTOM_PX: f64 = -10.0;

/// Radius of the glow drawn around each particle, in the particle's color.
pub const GLOW_RADIUS_PX: f64 = 12.0;

/// Opacity over a particle's lifetime.
pub const OPACITY_TRACK: Track = Track { from: 0.8, to: 0.0 };

/// Scale over a particle's lifetime.
pub const SCALE_TRACK: Track = Track { from: 1.0, to: 0.0 };

/// Easing of the rise: fast start, long soft landing.
pub const DUST_EASING: CubicBezier = CubicBezier {
    x1: 0.1,
    y1: 0.0,
    x2: 0.3,
    y2: 1.0,
};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Build a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::config_validation(format!("invalid color '{s}': expected #RRGGBB"));
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A non-empty, shared, read-only set of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Arc<[Color]>);

impl Palette {
    /// Build a palette. Returns `None` for an empty color list.
    #[must_use]
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self(colors.into()))
        }
    }

    /// Parse a list of `#RRGGBB` strings.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list or a malformed color.
    pub fn parse<S: AsRef<str>>(colors: &[S]) -> Result<Self> {
        let colors = colors
            .iter()
            .map(|c| c.as_ref().parse())
            .collect::<Result<Vec<Color>>>()?;
        Self::new(colors).ok_or_else(|| Error::config_validation("palette must not be empty"))
    }

    /// The colors in this palette.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    /// Pick a color uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        self.0[rng.gen_range(0..self.0.len())]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(Arc::from(DEFAULT_COLORS.as_slice()))
    }
}

/// A value animated linearly (before easing) from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Value at the start of the animation.
    pub from: f64,
    /// Value at the end of the animation.
    pub to: f64,
}

impl Track {
    /// Value at `progress` in `[0, 1]` (clamped).
    #[must_use]
    pub fn at(&self, progress: f64) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }
}

/// CSS-style cubic Bézier timing function control points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    /// First control point x.
    pub x1: f64,
    /// First control point y.
    pub y1: f64,
    /// Second control point x.
    pub x2: f64,
    /// Second control point y.
    pub y2: f64,
}

impl fmt::Display for CubicBezier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cubic-bezier({}, {}, {}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

/// One ephemeral dust mote.
///
/// Positions use the units a web surface would: viewport-width percent for the
/// horizontal start, pixels for the horizontal drift, viewport-height percent
/// for the rise (negative is upward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DustParticle {
    /// Diameter in pixels.
    pub size: f64,
    /// Fill and glow color.
    pub color: Color,
    /// Horizontal start, in viewport-width percent.
    pub start_x_vw: f64,
    /// Vertical start relative to the bottom edge, in pixels.
    pub start_bottom_px: f64,
    /// Horizontal offset at the end of the animation, in pixels.
    pub dest_x_px: f64,
    /// Vertical offset at the end of the animation, in viewport-height percent.
    pub dest_y_vh: f64,
    /// How long the particle lives before it removes itself.
    #[serde(with = "duration_millis")]
    pub lifetime: Duration,
    /// Glow radius in pixels.
    pub glow_px: f64,
    /// Opacity over the lifetime.
    pub opacity: Track,
    /// Scale over the lifetime.
    pub scale: Track,
    /// Timing function of the animation.
    pub easing: CubicBezier,
}

mod duration_millis {
    use std::time::Duration;

    pub fn serialize<S: serde::Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Ranges particle parameters are sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct DustParams {
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
    /// Shortest lifetime.
    pub min_lifetime: Duration,
    /// Longest lifetime.
    pub max_lifetime: Duration,
    /// Colors to choose from.
    pub palette: Palette,
}

impl Default for DustParams {
    fn default() -> Self {
        Self {
            min_size: 1.0,
            max_size: 5.0,
            min_rise_vh: 120.0,
            max_rise_vh: 220.0,
            max_drift_px: 150.0,
            min_lifetime: Duration::from_millis(2_000),
            max_lifetime: Duration::from_millis(4_000),
            palette: Palette::default(),
        }
    }
}

impl DustParams {
    /// Build sampling ranges from the `[dust]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the palette is empty or malformed.
    pub fn from_config(config: &DustConfig) -> Result<Self> {
        Ok(Self {
            min_size: config.min_size,
            max_size: config.max_size,
            min_rise_vh: config.min_rise_vh,
            max_rise_vh: config.max_rise_vh,
            max_drift_px: config.max_drift_px,
            min_lifetime: Duration::from_millis(config.min_lifetime_ms),
            max_lifetime: Duration::from_millis(config.max_lifetime_ms),
            palette: Palette::parse(&config.palette)?,
        })
    }

    /// Draw one particle. Every parameter is sampled independently.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DustParticle {
        let size = uniform(rng, self.min_size, self.max_size);
        let color = self.palette.choose(rng);
        let start_x_vw = uniform(rng, 0.0, 100.0);
        let dest_y_vh = -uniform(rng, self.min_rise_vh, self.max_rise_vh);
        let dest_x_px = uniform(rng, -self.max_drift_px, self.max_drift_px);
        let lifetime = self.sample_lifetime(rng);

        DustParticle {
            size,
            color,
            start_x_vw,
            start_bottom_px: START_BOTTOM_PX,
            dest_x_px,
            dest_y_vh,
            lifetime,
            glow_px: GLOW_RADIUS_PX,
            opacity: OPACITY_TRACK,
            scale: SCALE_TRACK,
            easing: DUST_EASING,
        }
    }

    fn sample_lifetime<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = u64::try_from(self.min_lifetime.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_lifetime.as_millis()).unwrap_or(u64::MAX);
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

/// Uniform in `[min, max)`; degenerate or unsampleable ranges collapse to `min`.
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if min < max && (max - min).is_finite() {
        rng.gen_range(min..max)
    } else {
        min
    }
}
