//! src/net/poller.rs
//!
//! Fixed-cadence ingestion: one request per cycle, never overlapping. A slow
//! response eats into the wait before the next cycle instead of stacking a
//! second request behind it. Failed or malformed cycles are skipped and the
//! chart keeps flowing from its last known value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chart::{Sample, SharedChart};

use super::payload::{self, PollError, PollPayload};

/// Floor for the per-request timeout so very fast poll cadences still give
/// the server a chance to answer.
const MIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Where telemetry bodies come from. Both real and simulated sources yield
/// raw JSON so every sample travels through the same decode step.
pub trait TelemetrySource: Send {
    fn label(&self) -> String;
    fn fetch(&mut self) -> Result<String, PollError>;
}

/// Polls the telemetry endpoint over HTTP.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSource {
    /// The request timeout equals the poll interval (with a small floor), so
    /// a stalled request can never delay the next cycle by more than one
    /// period.
    pub fn new(url: &str, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(interval.max(MIN_TIMEOUT))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl TelemetrySource for HttpSource {
    fn label(&self) -> String {
        self.url.clone()
    }

    /// The body is fetched as text and decoded separately, so a 200 carrying
    /// garbage classifies as malformed rather than a transport failure.
    fn fetch(&mut self) -> Result<String, PollError> {
        let resp = self.client.get(&self.url).send()?.error_for_status()?;
        Ok(resp.text()?)
    }
}

/// Built-in generator: a slow sine swell with jitter on top, emitted in the
/// same single-object JSON shape the real endpoint uses.
pub struct SimSource {
    rng: StdRng,
    tick: u64,
}

impl SimSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            tick: 0,
        }
    }
}

impl Default for SimSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for SimSource {
    fn label(&self) -> String {
        "simulator".to_string()
    }

    fn fetch(&mut self) -> Result<String, PollError> {
        let wave = (self.tick as f64 / 5.0).sin();
        let jitter: f64 = self.rng.random_range(-12.0..12.0);
        let latency = (80.0 + wave * 40.0 + jitter).clamp(20.0, 150.0);
        self.tick += 1;
        Ok(serde_json::json!({ "latency": latency }).to_string())
    }
}

/// Cooperative stop flag shared between the app and the poll thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Turns decoded payloads into timestamped samples.
///
/// History arrays are append-only on the server side, so a high-water mark
/// tracks how many entries have already been consumed; each cycle pushes
/// only the entries beyond it. When several new entries arrive in one cycle
/// their timestamps are spread evenly across the span since the previous
/// push, keeping mapped x positions distinct and monotonic. A first batch
/// spans one interval per entry, clamped to what the clock can reach back.
/// A shorter array than the mark means the server restarted; the mark
/// resets and the array counts as fresh history.
pub struct Normalizer {
    interval: Duration,
    consumed: usize,
    last_push: Option<Instant>,
}

impl Normalizer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            consumed: 0,
            last_push: None,
        }
    }

    pub fn stamp(&mut self, payload: PollPayload, now: Instant) -> Vec<Sample> {
        let fresh: Vec<f64> = match payload {
            PollPayload::Latest(v) => vec![v],
            PollPayload::History(values) => {
                if values.len() < self.consumed {
                    self.consumed = 0;
                }
                let fresh = values[self.consumed..].to_vec();
                self.consumed = values.len();
                fresh
            }
        };

        let k = fresh.len();
        if k == 0 {
            return Vec::new();
        }

        let want = match self.last_push {
            Some(t) => now.saturating_duration_since(t),
            None => u32::try_from(k)
                .ok()
                .and_then(|k| self.interval.checked_mul(k))
                .unwrap_or(Duration::MAX),
        };
        let span = clamped_span(now, want);
        self.last_push = Some(now);

        let base = now - span;
        fresh
            .into_iter()
            .enumerate()
            .map(|(i, value)| Sample {
                value,
                at: base + span.mul_f64((i + 1) as f64 / k as f64),
            })
            .collect()
    }
}

/// Walk `want` down until `now` can reach back that far on the monotonic
/// clock. Zero always can, so this terminates.
fn clamped_span(now: Instant, want: Duration) -> Duration {
    let mut span = want;
    while now.checked_sub(span).is_none() {
        span /= 2;
    }
    span
}

/// Run one poll cycle against the shared chart.
fn poll_cycle(
    source: &mut dyn TelemetrySource,
    shared: &SharedChart,
    normalizer: &mut Normalizer,
) {
    let outcome = source.fetch().and_then(|body| payload::decode(&body));
    match outcome {
        Ok(payload) => {
            let now = Instant::now();
            let samples = normalizer.stamp(payload, now);
            let mut chart = shared.write().unwrap();
            let mut pushed = 0usize;
            for sample in samples {
                match chart.buffer.push(sample) {
                    Ok(()) => pushed += 1,
                    // monotonicity is the normalizer's job; a rejection here
                    // is a logic defect worth seeing in the log
                    Err(e) => log::warn!("sample rejected: {}", e),
                }
            }
            chart.link.record_success(pushed, now);
        }
        Err(e) => {
            log::warn!("poll cycle skipped: {}", e);
            shared.write().unwrap().link.record_failure();
        }
    }
}

fn sleep_until(deadline: Instant, token: &CancelToken) {
    while !token.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        // short naps so cancellation is picked up promptly
        thread::sleep((deadline - now).min(Duration::from_millis(50)));
    }
}

fn poll_loop(
    mut source: Box<dyn TelemetrySource>,
    shared: SharedChart,
    interval: Duration,
    token: CancelToken,
) {
    let mut normalizer = Normalizer::new(interval);
    log::info!("poller started, interval {:?}", interval);
    while !token.is_cancelled() {
        let cycle_start = Instant::now();
        poll_cycle(source.as_mut(), &shared, &mut normalizer);
        sleep_until(cycle_start + interval, &token);
    }
    log::info!("poller stopped");
}

/// Spawn the poll thread. The caller keeps the token for teardown and joins
/// the handle after cancelling.
pub fn spawn(
    source: Box<dyn TelemetrySource>,
    shared: SharedChart,
    interval: Duration,
    token: CancelToken,
) -> thread::JoinHandle<()> {
    thread::spawn(move || poll_loop(source, shared, interval, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartConfig, LinkState, new_shared};

    const INTERVAL: Duration = Duration::from_millis(100);

    struct FakeSource {
        bodies: Vec<Result<String, PollError>>,
    }

    impl FakeSource {
        fn new(bodies: Vec<Result<String, PollError>>) -> Self {
            let mut bodies = bodies;
            bodies.reverse();
            Self { bodies }
        }
    }

    impl TelemetrySource for FakeSource {
        fn label(&self) -> String {
            "fake".to_string()
        }

        fn fetch(&mut self) -> Result<String, PollError> {
            self.bodies
                .pop()
                .unwrap_or_else(|| Err(PollError::Network("exhausted".to_string())))
        }
    }

    fn fresh_chart() -> SharedChart {
        new_shared(ChartConfig::default(), INTERVAL, "fake".to_string())
    }

    #[test]
    fn malformed_payload_leaves_the_buffer_unchanged() {
        let shared = fresh_chart();
        let mut normalizer = Normalizer::new(INTERVAL);
        let mut source = FakeSource::new(vec![
            Ok(r#"{"latency": 42.0}"#.to_string()),
            Ok(r#"{"latency": "high"}"#.to_string()),
        ]);

        poll_cycle(&mut source, &shared, &mut normalizer);
        let len_before = shared.read().unwrap().buffer.len();
        assert_eq!(len_before, 1);

        poll_cycle(&mut source, &shared, &mut normalizer);
        let chart = shared.read().unwrap();
        assert_eq!(chart.buffer.len(), len_before);
        assert_eq!(chart.link.skipped, 1);
    }

    #[test]
    fn network_failure_skips_the_cycle() {
        let shared = fresh_chart();
        let mut normalizer = Normalizer::new(INTERVAL);
        let mut source = FakeSource::new(vec![Err(PollError::Network(
            "connection refused".to_string(),
        ))]);

        poll_cycle(&mut source, &shared, &mut normalizer);
        let chart = shared.read().unwrap();
        assert!(chart.buffer.is_empty());
        assert_eq!(chart.link.consecutive_failures, 1);
    }

    #[test]
    fn history_cycles_push_only_entries_beyond_the_mark() {
        let shared = fresh_chart();
        let mut normalizer = Normalizer::new(INTERVAL);
        let mut source = FakeSource::new(vec![
            Ok(r#"[{"latency": 10}, {"latency": 20}]"#.to_string()),
            Ok(r#"[{"latency": 10}, {"latency": 20}, {"latency": 30}]"#.to_string()),
        ]);

        poll_cycle(&mut source, &shared, &mut normalizer);
        assert_eq!(shared.read().unwrap().buffer.len(), 2);

        poll_cycle(&mut source, &shared, &mut normalizer);
        let chart = shared.read().unwrap();
        assert_eq!(chart.buffer.len(), 3);
        let values: Vec<f64> = chart.buffer.snapshot().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn a_shrunken_history_resets_the_mark() {
        let shared = fresh_chart();
        let mut normalizer = Normalizer::new(INTERVAL);
        let mut source = FakeSource::new(vec![
            Ok(r#"[{"latency": 10}, {"latency": 20}, {"latency": 30}]"#.to_string()),
            Ok(r#"[{"latency": 5}]"#.to_string()),
        ]);

        poll_cycle(&mut source, &shared, &mut normalizer);
        poll_cycle(&mut source, &shared, &mut normalizer);

        let chart = shared.read().unwrap();
        assert_eq!(chart.buffer.len(), 4);
        assert_eq!(chart.buffer.newest().map(|s| s.value), Some(5.0));
    }

    #[test]
    fn stamped_batches_are_strictly_increasing_and_end_at_now() {
        let mut normalizer = Normalizer::new(INTERVAL);
        let t0 = Instant::now();
        let first = normalizer.stamp(PollPayload::History(vec![1.0, 2.0]), t0);
        assert_eq!(first.len(), 2);
        assert!(first[0].at < first[1].at);
        assert_eq!(first[1].at, t0);

        let t1 = t0 + INTERVAL;
        let second = normalizer.stamp(PollPayload::History(vec![1.0, 2.0, 3.0, 4.0]), t1);
        assert_eq!(second.len(), 2);
        assert!(first[1].at < second[0].at);
        assert!(second[0].at < second[1].at);
        assert_eq!(second[1].at, t1);
    }

    #[test]
    fn an_oversized_first_batch_stays_within_clock_bounds() {
        let mut normalizer = Normalizer::new(Duration::from_millis(u64::MAX));
        let now = Instant::now();
        let stamped = normalizer.stamp(PollPayload::History(vec![0.0; 1100]), now);

        assert_eq!(stamped.len(), 1100);
        assert_eq!(stamped.last().map(|s| s.at), Some(now));
        for pair in stamped.windows(2) {
            assert!(pair[0].at <= pair[1].at);
        }
    }

    #[test]
    fn latest_shape_stamps_a_single_sample_at_now() {
        let mut normalizer = Normalizer::new(INTERVAL);
        let now = Instant::now();
        let stamped = normalizer.stamp(PollPayload::Latest(42.0), now);
        assert_eq!(stamped.len(), 1);
        assert_eq!(stamped[0].value, 42.0);
        assert_eq!(stamped[0].at, now);
    }

    #[test]
    fn empty_history_pushes_nothing_but_counts_as_success() {
        let shared = fresh_chart();
        let mut normalizer = Normalizer::new(INTERVAL);
        let mut source = FakeSource::new(vec![Ok("[]".to_string())]);

        poll_cycle(&mut source, &shared, &mut normalizer);
        let chart = shared.read().unwrap();
        assert!(chart.buffer.is_empty());
        assert_eq!(
            chart.link.state(Instant::now(), INTERVAL),
            LinkState::Live
        );
    }

    #[test]
    fn cancelled_token_stops_the_loop_before_the_first_cycle() {
        let shared = fresh_chart();
        let token = CancelToken::new();
        token.cancel();

        let source = Box::new(FakeSource::new(vec![Ok(r#"{"latency": 1}"#.to_string())]));
        let handle = spawn(source, shared.clone(), INTERVAL, token);
        handle.join().unwrap();

        assert!(shared.read().unwrap().buffer.is_empty());
    }

    #[test]
    fn cancellation_interrupts_a_long_cycle_wait() {
        let shared = fresh_chart();
        let token = CancelToken::new();
        let source = Box::new(FakeSource::new(vec![Ok("[]".to_string())]));
        let handle = spawn(source, shared, Duration::from_secs(3600), token.clone());

        // let the first cycle finish and the loop settle into its wait
        thread::sleep(Duration::from_millis(60));
        let asked = Instant::now();
        token.cancel();
        handle.join().unwrap();
        assert!(asked.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn simulator_bodies_decode_within_the_expected_range() {
        let mut sim = SimSource::new();
        for _ in 0..32 {
            let body = sim.fetch().unwrap();
            match payload::decode(&body).unwrap() {
                PollPayload::Latest(v) => assert!((20.0..=150.0).contains(&v)),
                other => panic!("unexpected shape: {:?}", other),
            }
        }
    }
}
