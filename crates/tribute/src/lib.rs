//! `tribute` - The milestone clock and celestial dust of a tribute page
//!
//! This library provides the countdown to the next anniversary, the owned
//! periodic ticks that drive it, and the dust particle generator with its
//! pluggable rendering surface.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod dust;
pub mod error;
pub mod logging;
pub mod ticker;

pub use clock::{CountdownClock, FixedTime, LocalTime, SimulatedTime, TimeSource};
pub use config::Config;
pub use countdown::{compute_remaining, AnniversaryDate, CountdownDuration};
pub use dust::{DustGenerator, DustParticle, Surface};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use ticker::{Ticker, TickerHandle};
