//! src/chart/project.rs
//!
//! Per-frame projection: live-head synthesis, the time/value to dot-grid
//! mapping, and off-screen trimming.
//!
//! Everything here is recomputed every frame because it depends on `now`;
//! nothing is persisted. The mapper works in braille-dot coordinates with
//! screen convention (x grows rightward, y grows downward, y = 0 at the top).

use std::time::Instant;

use ratatui::layout::Rect;

use super::config::{ChartConfig, MARGIN_FRAC};
use super::sample::Sample;

/// Points whose x falls below this many dots left of the surface are dropped
/// from the frame, except the one closest to the edge which is kept so the
/// curve enters the frame without a visible seam.
pub const OFFSCREEN_MARGIN: f64 = 8.0;

/// A mapped point on the dot grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotPoint {
    pub x: f64,
    pub y: f64,
}

/// Dot-grid dimensions of the drawable surface.
///
/// Each terminal cell carries a 2x4 braille dot matrix, so the backing store
/// is twice as wide and four times as tall as the cell rectangle. A change in
/// the cell rectangle invalidates every derived dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub cols: u16,
    pub rows: u16,
    pub width_px: u32,
    pub height_px: u32,
}

impl SurfaceSize {
    /// Derive the dot grid from a cell rectangle. Returns `None` when the
    /// rectangle is too small to render into; the caller skips the frame and
    /// retries on the next tick.
    pub fn from_rect(area: Rect) -> Option<Self> {
        if area.width < 4 || area.height < 3 {
            return None;
        }
        Some(Self {
            cols: area.width,
            rows: area.height,
            width_px: u32::from(area.width) * 2,
            height_px: u32::from(area.height) * 4,
        })
    }

    pub fn width(&self) -> f64 {
        f64::from(self.width_px)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.height_px)
    }
}

/// Maps a sample's age and magnitude to dot coordinates under a fixed value
/// domain. Built fresh each frame from the current surface size.
#[derive(Clone, Copy, Debug)]
pub struct Mapper {
    width: f64,
    height: f64,
    margin: f64,
    avail: f64,
    speed: f64,
    domain: (f64, f64),
}

impl Mapper {
    pub fn new(cfg: &ChartConfig, size: SurfaceSize) -> Self {
        let height = size.height();
        let margin = height * MARGIN_FRAC;
        Self {
            width: size.width(),
            height,
            margin,
            avail: height - 2.0 * margin,
            speed: cfg.scroll_speed,
            domain: cfg.domain,
        }
    }

    /// Map one sample at render time `now`.
    ///
    /// Newer samples land closer to the right edge; a sample exactly at `now`
    /// lands on it. Values are clamped into the domain before the vertical
    /// mapping, so spikes beyond the domain flatten against the margins
    /// instead of rescaling the axis.
    pub fn map(&self, sample: &Sample, now: Instant) -> DotPoint {
        let age = now.saturating_duration_since(sample.at).as_secs_f64();
        let x = self.width - age * self.speed;

        let span = (self.domain.1 - self.domain.0).max(f64::EPSILON);
        let norm = ((sample.value - self.domain.0) / span).clamp(0.0, 1.0);
        let y = self.height - norm * self.avail - self.margin;

        DotPoint { x, y }
    }

    /// Screen y of the upper padding edge (where `domain.1` maps).
    pub fn top(&self) -> f64 {
        self.margin
    }

    /// Screen y of the lower padding edge (where `domain.0` maps).
    pub fn bottom(&self) -> f64 {
        self.height - self.margin
    }
}

/// Synthesize the trailing live point: the last known value replayed at
/// render time, so the line keeps advancing between deliveries. No head is
/// produced for an empty snapshot, or when the newest sample already sits at
/// `now`.
pub fn live_head(samples: &[Sample], now: Instant) -> Option<Sample> {
    let last = samples.last()?;
    if now > last.at {
        Some(Sample::new(last.value, now))
    } else {
        None
    }
}

/// Build the drawable point sequence for one frame: map every buffered
/// sample, append the live head, and trim the far-off-screen prefix.
pub fn project_frame(samples: &[Sample], now: Instant, mapper: &Mapper) -> Vec<DotPoint> {
    let mut points: Vec<DotPoint> = Vec::with_capacity(samples.len() + 1);
    for s in samples {
        points.push(mapper.map(s, now));
    }
    if let Some(head) = live_head(samples, now) {
        points.push(mapper.map(&head, now));
    }
    trim_offscreen(points)
}

/// Drop points that scrolled past the left edge, keeping the single nearest
/// off-screen point so the first visible segment still anchors off-frame.
fn trim_offscreen(points: Vec<DotPoint>) -> Vec<DotPoint> {
    match points.iter().position(|p| p.x >= -OFFSCREEN_MARGIN) {
        None => Vec::new(),
        Some(0) => points,
        Some(i) => points[i - 1..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    fn test_size() -> SurfaceSize {
        // 250x30 cells -> 500x120 dots
        SurfaceSize {
            cols: 250,
            rows: 30,
            width_px: 500,
            height_px: 120,
        }
    }

    fn test_config(speed: f64) -> ChartConfig {
        ChartConfig {
            scroll_speed: speed,
            domain: (0.0, 200.0),
            ..ChartConfig::default()
        }
    }

    #[test]
    fn surface_size_rejects_degenerate_rects() {
        assert!(SurfaceSize::from_rect(Rect::new(0, 0, 3, 10)).is_none());
        assert!(SurfaceSize::from_rect(Rect::new(0, 0, 10, 2)).is_none());
        let s = SurfaceSize::from_rect(Rect::new(0, 0, 40, 10)).unwrap();
        assert_eq!((s.width_px, s.height_px), (80, 40));
    }

    #[test]
    fn live_head_repeats_last_value_at_now() {
        let base = Instant::now();
        let samples = [
            Sample::new(10.0, base),
            Sample::new(50.0, base + Duration::from_millis(100)),
        ];
        let now = base + Duration::from_millis(150);
        let head = live_head(&samples, now).unwrap();
        assert_eq!(head.value, 50.0);
        assert_eq!(head.at, now);
    }

    #[test]
    fn live_head_absent_for_empty_or_current_snapshot() {
        let base = Instant::now();
        assert!(live_head(&[], base).is_none());
        // newest sample already at render time: it is the head
        let samples = [Sample::new(5.0, base)];
        assert!(live_head(&samples, base).is_none());
    }

    #[test]
    fn x_is_strictly_monotonic_in_time() {
        let base = Instant::now();
        let mapper = Mapper::new(&test_config(100.0), test_size());
        let now = base + Duration::from_millis(500);

        let older = mapper.map(&Sample::new(50.0, base), now);
        let newer = mapper.map(&Sample::new(50.0, base + Duration::from_millis(200)), now);
        assert!(newer.x > older.x);
    }

    #[test]
    fn domain_extremes_hit_the_margins() {
        let mapper = Mapper::new(&test_config(100.0), test_size());
        let now = Instant::now();

        let top = mapper.map(&Sample::new(200.0, now), now);
        let bottom = mapper.map(&Sample::new(0.0, now), now);
        approx(top.y, mapper.top());
        approx(bottom.y, mapper.bottom());
        approx(mapper.top(), 120.0 * MARGIN_FRAC);
        approx(mapper.bottom(), 120.0 - 120.0 * MARGIN_FRAC);
    }

    #[test]
    fn values_outside_the_domain_clamp_to_the_margins() {
        let mapper = Mapper::new(&test_config(100.0), test_size());
        let now = Instant::now();

        let above = mapper.map(&Sample::new(900.0, now), now);
        let below = mapper.map(&Sample::new(-50.0, now), now);
        approx(above.y, mapper.top());
        approx(below.y, mapper.bottom());
    }

    #[test]
    fn frame_projection_places_head_on_the_right_edge() {
        // 0.1 dots per ms, 500 dots wide: sample 50ms old sits 5 dots in
        let base = Instant::now();
        let samples = [
            Sample::new(10.0, base),
            Sample::new(50.0, base + Duration::from_millis(100)),
        ];
        let now = base + Duration::from_millis(150);
        let mapper = Mapper::new(&test_config(100.0), test_size());

        let pts = project_frame(&samples, now, &mapper);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[2].x, 500.0);
        approx(pts[1].x, 495.0);
        // head y equals the newest sample's y (same value)
        approx(pts[2].y, pts[1].y);
    }

    #[test]
    fn trim_keeps_one_seam_guard_point() {
        let mk = |x: f64| DotPoint { x, y: 0.0 };
        let pts = vec![mk(-30.0), mk(-12.0), mk(-3.0), mk(40.0)];
        let trimmed = trim_offscreen(pts);
        let xs: Vec<f64> = trimmed.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-12.0, -3.0, 40.0]);
    }

    #[test]
    fn trim_of_fully_offscreen_frame_is_empty() {
        let mk = |x: f64| DotPoint { x, y: 0.0 };
        assert!(trim_offscreen(vec![mk(-100.0), mk(-50.0)]).is_empty());
        assert!(trim_offscreen(Vec::new()).is_empty());
    }
}
