//! src/chart/config.rs
//!
//! Immutable visual configuration for the chart engine: scroll speed, fixed
//! value domain, retention window, stroke/glow geometry, and the color theme.
//!
//! Everything here is decided once at startup; the render path only reads.

use std::time::Duration;

use ratatui::style::Color;

/// Fraction of the surface height reserved above and below the curve so the
/// line never touches the frame edges.
pub const MARGIN_FRAC: f64 = 0.05;

#[derive(Clone, Debug)]
pub struct ChartConfig {
    /// Horizontal flow rate in dots per second. A sample `t` seconds old is
    /// drawn `t * scroll_speed` dots left of the right edge.
    pub scroll_speed: f64,

    /// Fixed value domain `(min, max)` in milliseconds. Values outside are
    /// clamped, not rescaled, so the line's shape carries the information.
    pub domain: (f64, f64),

    /// How much history the sample buffer retains before pruning.
    pub window: Duration,

    /// Halo radius around the stroke, in dots. Zero disables the glow.
    pub glow_radius: u16,

    /// Stroke thickness in dots.
    pub line_width: u16,

    /// Colors for stroke, fill, and grid.
    pub theme: Theme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            scroll_speed: 30.0,
            domain: (0.0, 200.0),
            window: Duration::from_secs(60),
            glow_radius: 2,
            line_width: 2,
            theme: Theme::default(),
        }
    }
}

/// Color set used by the canvas passes. Terminal cells have no alpha channel,
/// so translucency is approximated by scaling channels toward black.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Stroke color at the old (left) end of the line.
    pub stroke_tail: (u8, u8, u8),
    /// Stroke color at the live (right) end of the line.
    pub stroke_head: (u8, u8, u8),
    /// Base color of the area fill beneath the curve.
    pub fill: (u8, u8, u8),
    /// Background grid color.
    pub grid: (u8, u8, u8),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            stroke_tail: (8, 145, 178),
            stroke_head: (34, 211, 238),
            fill: (6, 182, 212),
            grid: (34, 34, 34),
        }
    }
}

impl Theme {
    /// Build a theme from an `RRGGBB` hex stroke color (leading `#` allowed).
    /// Tail and fill shades are derived from the head color; the grid keeps
    /// its default near-black.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let head = parse_hex(hex)?;
        Some(Self {
            stroke_tail: scale_rgb(head, 0.55),
            stroke_head: head,
            fill: scale_rgb(head, 0.85),
            grid: Theme::default().grid,
        })
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    // length counts bytes; the ASCII gate keeps the fixed slices on char
    // boundaries
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Scale a color toward black by `t` in `[0, 1]` (1.0 keeps the color).
pub fn scale_rgb(c: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    (
        (c.0 as f64 * t).round() as u8,
        (c.1 as f64 * t).round() as u8,
        (c.2 as f64 * t).round() as u8,
    )
}

/// Linear blend between two colors by `t` in `[0, 1]`.
pub fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let ch = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    (ch(a.0, b.0), ch(a.1, b.1), ch(a.2, b.2))
}

/// Convert an rgb tuple into a ratatui color.
pub fn to_color(c: (u8, u8, u8)) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}
