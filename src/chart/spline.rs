//! src/chart/spline.rs
//!
//! Catmull-Rom style smoothing: turns the mapped point sequence into cubic
//! segments, then flattens them into a dense polyline for dot rasterization.
//!
//! Control points follow the uniform Catmull-Rom construction
//! `cp1 = p1 + (p2 - p0) / 6`, `cp2 = p2 - (p3 - p1) / 6`. Missing neighbors
//! at either end reuse the nearest endpoint (clamped boundary), which avoids
//! overshoot where the curve enters and leaves the visible window.

use super::project::DotPoint;

/// One cubic piece of the curve, from `from` to `to` via two control points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicSegment {
    pub from: DotPoint,
    pub cp1: DotPoint,
    pub cp2: DotPoint,
    pub to: DotPoint,
}

impl CubicSegment {
    /// Evaluate the cubic at `t` in `[0, 1]`.
    pub fn eval(&self, t: f64) -> DotPoint {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        DotPoint {
            x: b0 * self.from.x + b1 * self.cp1.x + b2 * self.cp2.x + b3 * self.to.x,
            y: b0 * self.from.y + b1 * self.cp1.y + b2 * self.cp2.y + b3 * self.to.y,
        }
    }
}

/// Fit cubic segments through `points`. Fewer than two points produce no
/// segments; the caller simply skips the draw for that frame.
pub fn catmull_rom(points: &[DotPoint]) -> Vec<CubicSegment> {
    if points.len() < 2 {
        return Vec::new();
    }
    let last = points.len() - 1;
    (0..last)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(last)];
            CubicSegment {
                from: p1,
                cp1: DotPoint {
                    x: p1.x + (p2.x - p0.x) / 6.0,
                    y: p1.y + (p2.y - p0.y) / 6.0,
                },
                cp2: DotPoint {
                    x: p2.x - (p3.x - p1.x) / 6.0,
                    y: p2.y - (p3.y - p1.y) / 6.0,
                },
                to: p2,
            }
        })
        .collect()
}

/// Flatten segments into a polyline dense enough that every dot column under
/// the curve is hit (roughly one vertex per dot of horizontal travel).
pub fn flatten(segments: &[CubicSegment]) -> Vec<DotPoint> {
    let Some(first) = segments.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(segments.len() * 8 + 1);
    out.push(first.from);
    for seg in segments {
        let steps = steps_for(seg);
        for k in 1..=steps {
            out.push(seg.eval(k as f64 / steps as f64));
        }
    }
    out
}

fn steps_for(seg: &CubicSegment) -> usize {
    let dx = (seg.to.x - seg.from.x).abs();
    (dx.ceil() as usize).clamp(4, 64)
}
