//! src/panels/status.rs
//!
//! Uplink status panel: link badge, source, cadence, and cycle counters.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::chart::{LinkState, SharedChart};

/// Read-only view over the poller's bookkeeping.
pub struct StatusPanel {
    pub shared: SharedChart,
}

impl StatusPanel {
    pub fn new(shared: SharedChart) -> Self {
        Self { shared }
    }
}

fn badge_style(state: LinkState) -> Style {
    let fg = match state {
        LinkState::Connecting => Color::Yellow,
        LinkState::Live => Color::Cyan,
        LinkState::Stale => Color::Yellow,
        LinkState::Offline => Color::Red,
    };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}

impl crate::ui::Panel for StatusPanel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let chart = self.shared.read().unwrap();
        let state = chart.link.state(std::time::Instant::now(), chart.poll_interval);

        let dim = Style::default().fg(Color::DarkGray);
        let lines = vec![
            Line::from(vec![
                Span::styled(format!("● {}", state.label()), badge_style(state)),
                Span::styled(
                    format!("  every {} ms", chart.poll_interval.as_millis()),
                    dim,
                ),
            ]),
            Line::from(vec![Span::styled(
                format!("source {}", chart.source_label),
                Style::default().fg(Color::Gray),
            )]),
            Line::from(vec![Span::styled(
                format!(
                    "cycles {}  samples {}  skipped {}",
                    chart.link.cycles, chart.link.samples_ingested, chart.link.skipped
                ),
                dim,
            )]),
            Line::from(vec![Span::styled(
                format!(
                    "window {}s  domain {:.0}..{:.0} ms  speed {:.0} dots/s",
                    chart.config.window.as_secs(),
                    chart.config.domain.0,
                    chart.config.domain.1,
                    chart.config.scroll_speed
                ),
                dim,
            )]),
        ];

        let block = Block::default().title("Uplink").borders(Borders::ALL);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
