//! src/chart/shared.rs
//!
//! Shared chart state: the sample buffer, uplink bookkeeping, and the last
//! known surface size, behind one lock joining the poll thread and the
//! render loop.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::config::ChartConfig;
use super::project::SurfaceSize;
use super::sample::SampleBuffer;

/// How many consecutive failed cycles flip the uplink to `Offline`.
pub const OFFLINE_AFTER: u32 = 3;

/// Uplink health derived from poll bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// No successful cycle yet.
    Connecting,
    /// A cycle succeeded recently.
    Live,
    /// Last success is aging but the source has not failed repeatedly.
    Stale,
    /// Repeated consecutive failures.
    Offline,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Connecting => "CONNECTING",
            LinkState::Live => "LIVE",
            LinkState::Stale => "STALE",
            LinkState::Offline => "OFFLINE",
        }
    }
}

/// Poll-cycle bookkeeping written by the poller, read by the status panel.
#[derive(Debug, Default)]
pub struct LinkStatus {
    pub cycles: u64,
    pub samples_ingested: u64,
    pub skipped: u64,
    pub consecutive_failures: u32,
    pub last_success: Option<Instant>,
}

impl LinkStatus {
    pub fn record_success(&mut self, new_samples: usize, now: Instant) {
        self.cycles += 1;
        self.samples_ingested += new_samples as u64;
        self.consecutive_failures = 0;
        self.last_success = Some(now);
    }

    pub fn record_failure(&mut self) {
        self.cycles += 1;
        self.skipped += 1;
        self.consecutive_failures += 1;
    }

    /// Classify the uplink at `now` given the poll cadence. A success within
    /// three intervals counts as live; beyond that the link is stale, and
    /// repeated failures turn it offline.
    pub fn state(&self, now: Instant, interval: Duration) -> LinkState {
        match self.last_success {
            None => {
                if self.consecutive_failures >= OFFLINE_AFTER {
                    LinkState::Offline
                } else {
                    LinkState::Connecting
                }
            }
            Some(t) => {
                if now.saturating_duration_since(t) <= interval * 3 {
                    LinkState::Live
                } else if self.consecutive_failures >= OFFLINE_AFTER {
                    LinkState::Offline
                } else {
                    LinkState::Stale
                }
            }
        }
    }
}

/// The authoritative chart object shared between the poll thread (appends)
/// and the render loop (prunes, snapshots, draws).
#[derive(Debug)]
pub struct ChartShared {
    pub buffer: SampleBuffer,
    pub link: LinkStatus,
    pub config: ChartConfig,
    /// Poll cadence, kept here so render-side panels can classify the link.
    pub poll_interval: Duration,
    /// Where samples come from, for the status panel.
    pub source_label: String,
    /// Last known dot-grid size; `None` until the first sized frame.
    pub surface: Option<SurfaceSize>,
    /// Background grid toggle, flipped from the keyboard.
    pub show_grid: bool,
}

impl ChartShared {
    pub fn new(config: ChartConfig, poll_interval: Duration, source_label: String) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            link: LinkStatus::default(),
            config,
            poll_interval,
            source_label,
            surface: None,
            show_grid: true,
        }
    }
}

/// Alias: the handle panels and the poller actually hold.
pub type SharedChart = Arc<RwLock<ChartShared>>;

/// Wrap a fresh [`ChartShared`] for sharing.
pub fn new_shared(
    config: ChartConfig,
    poll_interval: Duration,
    source_label: String,
) -> SharedChart {
    Arc::new(RwLock::new(ChartShared::new(
        config,
        poll_interval,
        source_label,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn link_starts_connecting_then_goes_live() {
        let mut link = LinkStatus::default();
        let now = Instant::now();
        assert_eq!(link.state(now, INTERVAL), LinkState::Connecting);

        link.record_success(1, now);
        assert_eq!(link.state(now, INTERVAL), LinkState::Live);
        assert_eq!(link.cycles, 1);
        assert_eq!(link.samples_ingested, 1);
    }

    #[test]
    fn link_goes_stale_as_the_last_success_ages() {
        let mut link = LinkStatus::default();
        let now = Instant::now();
        link.record_success(1, now);

        let later = now + INTERVAL * 4;
        assert_eq!(link.state(later, INTERVAL), LinkState::Stale);
    }

    #[test]
    fn repeated_failures_turn_the_link_offline() {
        let mut link = LinkStatus::default();
        let now = Instant::now();
        link.record_success(1, now);
        for _ in 0..OFFLINE_AFTER {
            link.record_failure();
        }

        let later = now + INTERVAL * 10;
        assert_eq!(link.state(later, INTERVAL), LinkState::Offline);
        assert_eq!(link.skipped, u64::from(OFFLINE_AFTER));

        // a success resets the failure streak
        link.record_success(1, later);
        assert_eq!(link.state(later, INTERVAL), LinkState::Live);
    }

    #[test]
    fn failures_without_any_success_also_go_offline() {
        let mut link = LinkStatus::default();
        for _ in 0..OFFLINE_AFTER {
            link.record_failure();
        }
        assert_eq!(link.state(Instant::now(), INTERVAL), LinkState::Offline);
    }
}
