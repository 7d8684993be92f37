//! Rendering of command results, as aligned text or JSON.

use std::io::Write;

use serde::Serialize;

use crate::config::Config;
use crate::countdown::CountdownDuration;
use crate::dust::SurfaceStats;
use crate::error::Result;

/// What a `tribute dust` run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DustSummary {
    /// Sessions triggered.
    pub sessions: u64,
    /// Particles the sessions should have spawned between them.
    pub expected_particles: u64,
    /// What the surface observed.
    pub surface: SurfaceStats,
}

/// Write one countdown reading, e.g. `01 Days  00 Hours  00 Minutes  00 Seconds`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_countdown<W: Write>(
    out: &mut W,
    remaining: CountdownDuration,
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &remaining)?;
        writeln!(out)?;
    } else {
        let cells: Vec<String> = remaining
            .labelled()
            .iter()
            .map(|(label, value)| format!("{value:02} {label}"))
            .collect();
        writeln!(out, "{}", cells.join("  "))?;
    }
    Ok(())
}

/// Write the summary of a dust run.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_dust_summary<W: Write>(
    out: &mut W,
    summary: &DustSummary,
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary)?;
        writeln!(out)?;
        return Ok(());
    }

    let stats = &summary.surface;
    writeln!(out, "Celestial dust")?;
    writeln!(out, "==============")?;
    writeln!(out, "Sessions:           {}", summary.sessions)?;
    writeln!(
        out,
        "Particles spawned:  {} (expected {})",
        stats.spawned, summary.expected_particles
    )?;
    writeln!(out, "Particles removed:  {}", stats.removed)?;
    writeln!(out, "Still alive:        {}", stats.alive)?;
    writeln!(out, "Peak alive:         {}", stats.peak_alive)?;
    if let Some((lo, hi)) = stats.size_range {
        writeln!(out, "Size range:         {lo:.2} - {hi:.2} px")?;
    }
    if let Some((lo, hi)) = stats.lifetime_range_ms {
        writeln!(out, "Lifetime range:     {lo} - {hi} ms")?;
    }
    writeln!(out, "Colors:             {}", stats.colors.join(", "))?;
    Ok(())
}

/// Write the effective configuration.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_config<W: Write>(out: &mut W, config: &Config, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, config)?;
        writeln!(out)?;
        return Ok(());
    }

    let countdown = &config.countdown;
    let dust = &config.dust;
    writeln!(out, "Current Configuration")?;
    writeln!(out, "=====================")?;
    writeln!(out)?;
    writeln!(out, "[Countdown]")?;
    writeln!(
        out,
        "  Anniversary:         {:02}-{:02}",
        countdown.month, countdown.day
    )?;
    writeln!(out, "  Tick interval (ms):  {}", countdown.tick_interval_ms)?;
    writeln!(out)?;
    writeln!(out, "[Dust]")?;
    writeln!(out, "  Session (ms):        {}", dust.session_ms)?;
    writeln!(out, "  Burst interval (ms): {}", dust.burst_interval_ms)?;
    writeln!(out, "  Burst size:          {}", dust.burst_size)?;
    writeln!(out, "  Size (px):           {} - {}", dust.min_size, dust.max_size)?;
    writeln!(
        out,
        "  Rise (vh):           {} - {}",
        dust.min_rise_vh, dust.max_rise_vh
    )?;
    writeln!(out, "  Drift (px):          +/- {}", dust.max_drift_px)?;
    writeln!(
        out,
        "  Lifetime (ms):       {} - {}",
        dust.min_lifetime_ms, dust.max_lifetime_ms
    )?;
    writeln!(out, "  Palette:             {}", dust.palette.join(", "))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// A sink whose every write fails, like a closed pipe.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe closed",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn summary() -> DustSummary {
        DustSummary {
            sessions: 2,
            expected_particles: 1_200,
            surface: SurfaceStats {
                spawned: 1_200,
                removed: 1_200,
                alive: 0,
                peak_alive: 830,
                size_range: Some((1.004, 4.998)),
                lifetime_range_ms: Some((2_001, 3_999)),
                colors: vec!["#B8860B".to_string(), "#D4AF37".to_string()],
            },
        }
    }

    #[test]
    fn test_countdown_text() {
        let remaining = CountdownDuration {
            days: 1,
            ..CountdownDuration::ZERO
        };
        let text = render(|out| write_countdown(out, remaining, false));
        assert_eq!(text, "01 Days  00 Hours  00 Minutes  00 Seconds\n");
    }

    #[test]
    fn test_countdown_json() {
        let remaining = CountdownDuration::from_millis(3_723_000);
        let text = render(|out| write_countdown(out, remaining, true));
        assert_eq!(
            text,
            "{\"days\":0,\"hours\":1,\"minutes\":2,\"seconds\":3}\n"
        );
    }

    #[test]
    fn test_dust_summary_text() {
        let text = render(|out| write_dust_summary(out, &summary(), false));
        assert!(text.contains("Particles spawned:  1200 (expected 1200)"));
        assert!(text.contains("Size range:         1.00 - 5.00 px"));
        assert!(text.contains("Lifetime range:     2001 - 3999 ms"));
        assert!(text.contains("#B8860B, #D4AF37"));
    }

    #[test]
    fn test_dust_summary_json() {
        let text = render(|out| write_dust_summary(out, &summary(), true));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["sessions"], 2);
        assert_eq!(value["surface"]["peak_alive"], 830);
    }

    #[test]
    fn test_config_text_and_json() {
        let config = Config::default();
        let text = render(|out| write_config(out, &config, false));
        assert!(text.contains("Anniversary:         01-31"));
        assert!(text.contains("#D4AF37, #FDFCFB, #B8860B, #E5E7EB"));

        let json = render(|out| write_config(out, &config, true));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let err = write_countdown(&mut ClosedPipe, CountdownDuration::ZERO, false).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_write_failure_is_json_error() {
        // serde_json wraps the underlying I/O failure in its own error type.
        let err = write_countdown(&mut ClosedPipe, CountdownDuration::ZERO, true).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
