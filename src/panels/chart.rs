//! src/panels/chart.rs
//!
//! Chart panel: readout row plus the braille canvas.
//!
//! Rendering happens in dot coordinates on a 2x4-per-cell braille grid. The
//! projection pipeline works in screen convention (y = 0 at the top); the
//! flip to the canvas widget's y-up coordinates happens only at draw time.
//! Paint order is grid, area fill, glow, core stroke, so the line stays
//! crisp where passes share a cell.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph,
        canvas::{Canvas, Line as CanvasLine, Painter, Shape},
    },
};

use crate::chart::SharedChart;
use crate::chart::config::{lerp_rgb, scale_rgb, to_color};
use crate::chart::project::{DotPoint, Mapper, SurfaceSize, project_frame};
use crate::chart::sample::summarize;
use crate::chart::spline;

/// Dot spacing of the background grid lines.
const GRID_SPACING: usize = 10;

pub struct ChartPanel {
    pub shared: SharedChart,
}

impl ChartPanel {
    pub fn new(shared: SharedChart) -> Self {
        Self { shared }
    }
}

impl crate::ui::Panel for ChartPanel {
    /// Draw the readout row and the chart canvas.
    ///
    /// The render path owns pruning: the retention cutoff is anchored to
    /// render time here, each frame, before the snapshot is taken. A
    /// degenerate panel rectangle skips the canvas for this frame and tries
    /// again on the next tick.
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let chunks = ratatui::layout::Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([
                ratatui::layout::Constraint::Length(3),
                ratatui::layout::Constraint::Min(0),
            ])
            .split(area);

        let now = Instant::now();
        let mut chart = self.shared.write().unwrap();

        if let Some(cutoff) = now.checked_sub(chart.config.window) {
            chart.buffer.prune(cutoff);
        }

        let cfg = chart.config.clone();
        let show_grid = chart.show_grid;
        let snapshot = chart.buffer.snapshot();

        let canvas_block = Block::default().borders(Borders::ALL);
        let inner = canvas_block.inner(chunks[1]);
        let size = match SurfaceSize::from_rect(inner) {
            Some(size) => {
                if chart.surface != Some(size) {
                    log::debug!(
                        "surface {}x{} cells, {}x{} dots",
                        size.cols,
                        size.rows,
                        size.width_px,
                        size.height_px
                    );
                    chart.surface = Some(size);
                }
                Some(size)
            }
            None => {
                if chart.surface.is_some() {
                    log::debug!("surface unavailable, skipping frames");
                    chart.surface = None;
                }
                None
            }
        };
        drop(chart);

        // Readout row: latest value plus window extremes
        let summary = summarize(&snapshot);
        let head_style = Style::default()
            .fg(to_color(cfg.theme.stroke_head))
            .add_modifier(Modifier::BOLD);
        let readout = match summary {
            Some(s) => Line::from(vec![
                Span::styled(format!("{:>4.0}", s.last), head_style),
                Span::styled(" ms", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("    min {:>3.0}  avg {:>3.0}  max {:>3.0}", s.min, s.avg, s.max),
                    Style::default().fg(Color::Gray),
                ),
            ]),
            None => Line::from(vec![
                Span::styled("   -", head_style),
                Span::styled(" ms", Style::default().fg(Color::DarkGray)),
            ]),
        };
        let readout = Paragraph::new(readout).block(
            Block::default()
                .title("System Latency")
                .borders(Borders::ALL),
        );
        f.render_widget(readout, chunks[0]);

        let Some(size) = size else {
            // too small to draw into; keep the frame border visible
            f.render_widget(canvas_block, chunks[1]);
            return;
        };

        let mapper = Mapper::new(&cfg, size);
        let dots = project_frame(&snapshot, now, &mapper);
        let verts = spline::flatten(&spline::catmull_rom(&dots));
        let tops = column_tops(&verts, size.width_px as usize);

        let max_x = (size.width_px - 1) as f64;
        let max_y = (size.height_px - 1) as f64;
        let half = f64::from(cfg.line_width / 2);
        let flip = move |y: f64| (max_y - y).clamp(0.0, max_y);

        let grid = GridDots {
            w: size.width_px,
            h: size.height_px,
            spacing: GRID_SPACING,
            color: to_color(cfg.theme.grid),
        };
        let fill = AreaFill {
            tops: &tops,
            h: size.height_px,
            color: cfg.theme.fill,
        };
        let awaiting = snapshot.is_empty();

        let canvas = Canvas::default()
            .block(canvas_block)
            .marker(Marker::Braille)
            .x_bounds([0.0, max_x])
            .y_bounds([0.0, max_y])
            .paint(|ctx| {
                if show_grid {
                    ctx.draw(&grid);
                }

                if verts.len() >= 2 {
                    ctx.draw(&fill);

                    // glow pass: dim halo rings fanning out from the stroke
                    for k in 1..=cfg.glow_radius {
                        let off = half + f64::from(k);
                        let shade = to_color(scale_rgb(
                            cfg.theme.stroke_head,
                            0.30 / f64::from(k),
                        ));
                        for pair in verts.windows(2) {
                            let Some((a, b)) = clip_segment(pair[0], pair[1], max_x) else {
                                continue;
                            };
                            for sign in [-1.0, 1.0] {
                                ctx.draw(&CanvasLine {
                                    x1: a.x,
                                    y1: flip(a.y + off * sign),
                                    x2: b.x,
                                    y2: flip(b.y + off * sign),
                                    color: shade,
                                });
                            }
                        }
                    }

                    // core stroke, colored left-to-right from tail to head
                    for pair in verts.windows(2) {
                        let Some((a, b)) = clip_segment(pair[0], pair[1], max_x) else {
                            continue;
                        };
                        let t = ((a.x + b.x) * 0.5) / max_x;
                        let color =
                            to_color(lerp_rgb(cfg.theme.stroke_tail, cfg.theme.stroke_head, t));
                        for i in 0..cfg.line_width {
                            let dy = f64::from(i) - half;
                            ctx.draw(&CanvasLine {
                                x1: a.x,
                                y1: flip(a.y + dy),
                                x2: b.x,
                                y2: flip(b.y + dy),
                                color,
                            });
                        }
                    }
                }

                if awaiting {
                    ctx.print(
                        max_x * 0.5 - 18.0,
                        max_y * 0.5,
                        Line::styled("awaiting telemetry", Style::default().fg(Color::DarkGray)),
                    );
                }
            });
        f.render_widget(canvas, chunks[1]);
    }
}

/// Topmost curve y per dot column, from the flattened polyline. Columns the
/// curve never crosses stay `None` and receive no fill.
fn column_tops(verts: &[DotPoint], cols: usize) -> Vec<Option<f64>> {
    let mut tops: Vec<Option<f64>> = vec![None; cols];
    let mut mark = |c: isize, y: f64| {
        if (0..cols as isize).contains(&c) {
            let slot = &mut tops[c as usize];
            *slot = Some(slot.map_or(y, |t: f64| t.min(y)));
        }
    };

    for pair in verts.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let c0 = a.x.round() as isize;
        let c1 = b.x.round() as isize;
        if c0 == c1 {
            mark(c0, a.y.min(b.y));
            continue;
        }
        let (lo, hi) = if c0 < c1 { (c0, c1) } else { (c1, c0) };
        for c in lo..=hi {
            let t = ((c as f64 - a.x) / (b.x - a.x)).clamp(0.0, 1.0);
            mark(c, a.y + (b.y - a.y) * t);
        }
    }
    tops
}

/// Clip a segment to the surface's x range, interpolating y at the cut.
/// Returns `None` when the segment lies entirely outside.
fn clip_segment(a: DotPoint, b: DotPoint, max_x: f64) -> Option<(DotPoint, DotPoint)> {
    let (a, b) = if a.x <= b.x { (a, b) } else { (b, a) };
    if b.x < 0.0 || a.x > max_x {
        return None;
    }
    let dx = b.x - a.x;
    if dx <= f64::EPSILON {
        return Some((a, b));
    }
    let y_at = |x: f64| a.y + (b.y - a.y) * ((x - a.x) / dx);
    let ax = a.x.max(0.0);
    let bx = b.x.min(max_x);
    Some((DotPoint { x: ax, y: y_at(ax) }, DotPoint { x: bx, y: y_at(bx) }))
}

/// Faint dotted background grid, painted before everything else.
struct GridDots {
    w: u32,
    h: u32,
    spacing: usize,
    color: Color,
}

impl Shape for GridDots {
    fn draw(&self, painter: &mut Painter<'_, '_>) {
        for x in (0..self.w as usize).step_by(self.spacing) {
            for y in (0..self.h as usize).step_by(2) {
                painter.paint(x, y, self.color);
            }
        }
        for y in (0..self.h as usize).step_by(self.spacing) {
            for x in (0..self.w as usize).step_by(2) {
                painter.paint(x, y, self.color);
            }
        }
    }
}

/// Vertical-gradient fill between the curve and the bottom edge, brightest
/// just under a high curve and fading to nothing at the baseline.
struct AreaFill<'a> {
    tops: &'a [Option<f64>],
    h: u32,
    color: (u8, u8, u8),
}

impl Shape for AreaFill<'_> {
    fn draw(&self, painter: &mut Painter<'_, '_>) {
        let h = f64::from(self.h);
        for (x, top) in self.tops.iter().enumerate() {
            let Some(top) = top else { continue };
            let start = top.ceil().max(0.0) as usize;
            for y in start..self.h as usize {
                let fade = 0.4 * (1.0 - y as f64 / h);
                painter.paint(x, y, to_color(scale_rgb(self.color, fade)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> DotPoint {
        DotPoint { x, y }
    }

    #[test]
    fn clip_drops_fully_outside_segments() {
        assert!(clip_segment(pt(-30.0, 5.0), pt(-10.0, 8.0), 499.0).is_none());
        assert!(clip_segment(pt(510.0, 5.0), pt(520.0, 8.0), 499.0).is_none());
    }

    #[test]
    fn clip_keeps_inside_segments_untouched() {
        let (a, b) = clip_segment(pt(10.0, 5.0), pt(20.0, 9.0), 499.0).unwrap();
        assert_eq!(a, pt(10.0, 5.0));
        assert_eq!(b, pt(20.0, 9.0));
    }

    #[test]
    fn clip_interpolates_y_at_the_left_edge() {
        // seam segment from the retained off-screen point
        let (a, b) = clip_segment(pt(-10.0, 0.0), pt(10.0, 20.0), 499.0).unwrap();
        assert_eq!(a, pt(0.0, 10.0));
        assert_eq!(b, pt(10.0, 20.0));
    }

    #[test]
    fn clip_interpolates_y_at_the_right_edge() {
        let (a, b) = clip_segment(pt(498.0, 0.0), pt(500.0, 4.0), 499.0).unwrap();
        assert_eq!(a, pt(498.0, 0.0));
        assert_eq!(b, pt(499.0, 2.0));
    }

    #[test]
    fn column_tops_cover_every_crossed_column() {
        let verts = [pt(0.0, 10.0), pt(4.0, 2.0)];
        let tops = column_tops(&verts, 8);
        for c in 0..=4 {
            assert!(tops[c].is_some(), "column {c} missing");
        }
        for c in 5..8 {
            assert!(tops[c].is_none());
        }
        // linear span: y drops 2 dots per column
        assert_eq!(tops[0], Some(10.0));
        assert_eq!(tops[2], Some(6.0));
        assert_eq!(tops[4], Some(2.0));
    }

    #[test]
    fn column_tops_keep_the_topmost_crossing() {
        // two segments over the same columns; the higher (smaller y) wins
        let verts = [pt(0.0, 10.0), pt(4.0, 10.0), pt(0.0, 4.0)];
        let tops = column_tops(&verts, 8);
        assert_eq!(tops[0], Some(4.0));
        assert_eq!(tops[4], Some(10.0));
    }

    #[test]
    fn column_tops_ignore_offscreen_columns() {
        let verts = [pt(-6.0, 3.0), pt(2.0, 3.0)];
        let tops = column_tops(&verts, 4);
        assert_eq!(tops.iter().filter(|t| t.is_some()).count(), 3);
        assert!(tops[3].is_none());
    }
}
