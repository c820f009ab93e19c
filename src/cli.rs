//! src/cli.rs
//!
//! Command-line configuration surface. Defaults mirror the dashboard the
//! telemetry service ships with: a one second poll against a local `/stats`
//! endpoint, a fixed 0..200 ms domain, and the cyan theme.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{bail, eyre, Result};

use crate::chart::{ChartConfig, Theme};

#[derive(Debug, Parser)]
#[command(author, version, about = "Streaming latency telemetry viewer", long_about = None)]
pub struct Cli {
    /// Telemetry endpoint to poll
    #[arg(long, default_value = "http://127.0.0.1:8000/stats")]
    pub url: String,

    /// Poll cadence in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Sample retention window in seconds
    #[arg(long, default_value_t = 60)]
    pub window_secs: u64,

    /// Horizontal flow rate in dots per second
    #[arg(long, default_value_t = 30.0)]
    pub speed: f64,

    /// Lower edge of the fixed value domain, in milliseconds
    #[arg(long, default_value_t = 0.0)]
    pub domain_min: f64,

    /// Upper edge of the fixed value domain, in milliseconds
    #[arg(long, default_value_t = 200.0)]
    pub domain_max: f64,

    /// Stroke color as RRGGBB hex
    #[arg(long, default_value = "22d3ee")]
    pub color: String,

    /// Glow halo radius in dots (0 disables)
    #[arg(long, default_value_t = 2)]
    pub glow: u16,

    /// Stroke thickness in dots
    #[arg(long, default_value_t = 2)]
    pub line_width: u16,

    /// Start with the background grid hidden
    #[arg(long)]
    pub no_grid: bool,

    /// Use the built-in signal generator instead of polling
    #[arg(long)]
    pub simulate: bool,

    /// Append debug logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate the flags and build the immutable chart configuration.
    pub fn chart_config(&self) -> Result<ChartConfig> {
        if self.interval_ms < 50 || self.interval_ms > 3_600_000 {
            bail!("--interval-ms must be between 50 and 3600000 (one hour)");
        }
        if self.window_secs == 0 {
            bail!("--window-secs must be at least 1");
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            bail!("--speed must be a positive number of dots per second");
        }
        if !self.domain_min.is_finite() || !self.domain_max.is_finite() {
            bail!("--domain-min and --domain-max must be finite");
        }
        if self.domain_max <= self.domain_min {
            bail!(
                "empty value domain: {} .. {}",
                self.domain_min,
                self.domain_max
            );
        }
        if self.line_width == 0 || self.line_width > 6 {
            bail!("--line-width must be between 1 and 6 dots");
        }
        if self.glow > 6 {
            bail!("--glow must be at most 6 dots");
        }
        let theme = Theme::from_hex(&self.color)
            .ok_or_else(|| eyre!("--color wants RRGGBB hex, got {:?}", self.color))?;

        Ok(ChartConfig {
            scroll_speed: self.speed,
            domain: (self.domain_min, self.domain_max),
            window: Duration::from_secs(self.window_secs),
            glow_radius: self.glow,
            line_width: self.line_width,
            theme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_dashboard() {
        let cli = Cli::parse_from(["latline"]);
        let cfg = cli.chart_config().unwrap();
        assert_eq!(cli.url, "http://127.0.0.1:8000/stats");
        assert_eq!(cli.poll_interval(), Duration::from_millis(1000));
        assert_eq!(cfg.domain, (0.0, 200.0));
        assert_eq!(cfg.window, Duration::from_secs(60));
        assert_eq!(cfg.theme.stroke_head, (0x22, 0xd3, 0xee));
        assert!(!cli.simulate);
        assert!(!cli.no_grid);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "latline",
            "--interval-ms",
            "250",
            "--speed",
            "60",
            "--color",
            "#ff8800",
            "--no-grid",
            "--simulate",
        ]);
        let cfg = cli.chart_config().unwrap();
        assert_eq!(cli.poll_interval(), Duration::from_millis(250));
        assert_eq!(cfg.scroll_speed, 60.0);
        assert_eq!(cfg.theme.stroke_head, (0xff, 0x88, 0x00));
        assert!(cli.no_grid);
        assert!(cli.simulate);
    }

    #[test]
    fn bad_flag_combinations_are_rejected() {
        let domain = Cli::parse_from(["latline", "--domain-min", "200", "--domain-max", "100"]);
        assert!(domain.chart_config().is_err());

        // f64 parsing accepts "NaN", and NaN slips past ordering checks
        let nan = Cli::parse_from(["latline", "--domain-max", "NaN"]);
        assert!(nan.chart_config().is_err());

        let interval = Cli::parse_from(["latline", "--interval-ms", "10"]);
        assert!(interval.chart_config().is_err());

        let interval = Cli::parse_from(["latline", "--interval-ms", "7200000"]);
        assert!(interval.chart_config().is_err());

        let color = Cli::parse_from(["latline", "--color", "teal"]);
        assert!(color.chart_config().is_err());

        let width = Cli::parse_from(["latline", "--line-width", "0"]);
        assert!(width.chart_config().is_err());
    }
}
