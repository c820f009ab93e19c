//! src/app.rs
//!
//! Live latency telemetry viewer
//! Polls a JSON stats endpoint (or an internal simulator) and stamps every
//! reading with an arrival instant. The readings scroll across the terminal
//! as a smoothed curve moving at a fixed dots-per-second speed.
//!
//! # Top-Level Application (`app.rs`)
//!
//! Constructs the shared chart state, starts the ingestion poller thread,
//! and runs the UI main loop for the terminal-based latency viewer.
//!
//! ## Overview
//! The application:
//! - Renders one live-updating latency curve with glow, area fill, and an
//!   optional background grid.
//! - Shows a link-state badge plus ingestion counters in a side panel.
//! - Polls the feed on a dedicated thread so rendering never blocks on IO.
//!
//! # Building and Running
//!
//! 1. From the project root:
//!    ```text
//!    cargo build --release
//!    ```
//!
//! 2. Run against a live endpoint:
//!    ```text
//!    cargo run --release -- --url http://127.0.0.1:8000/stats
//!    ```
//!
//! 3. Or run self-contained with the built-in wave simulator:
//!    ```text
//!    cargo run --release -- --simulate
//!    ```
//!
//! ### Environment Notes
//! - Terminal UI uses the `ratatui` and `crossterm` crates.
//! - The feed is polled every `--interval-ms` milliseconds (default 1000).
//! - Pass `--log-file latline.log` to append debug logs; nothing is ever
//!   written to the terminal while the UI owns it.
//!
//! # Keyboard Controls (Interactive)
//!
//! - **q** / **Esc** - Quit and restore the terminal.
//! - **g** - Toggle the background grid.
//!
//! # Feed Payloads
//!
//! Each poll expects a JSON body in one of three shapes:
//!
//! - A bare array of readings: `[82.0, 79.5, 91.2]`
//! - An object with a history field: `{"history": [{"latency": 82.0}, 79.5]}`
//! - A single latest reading: `{"latency": 82.0}`
//!
//! Array entries may be numbers or `{"latency": <number>}` records. A body
//! that fits none of these shapes, or carries a non-numeric reading, fails
//! the cycle as malformed: nothing is appended and the curve keeps flowing
//! from its last known value. An empty history is a successful poll that
//! appends nothing.
//!
//! # Live Head and Scrolling
//!
//! The newest sample is projected slightly ahead of its arrival time, so
//! the curve appears to be drawn toward the right edge instead of popping
//! in. Samples slide left at the configured `--speed` (dots per second)
//! and are pruned once they age out of the `--window-secs` span.
//!
//! # Link States
//!
//! - `CONNECTING` - no poll has succeeded yet.
//! - `LIVE` - the last success is within three poll intervals.
//! - `STALE` - connected before, but the feed has gone quiet.
//! - `OFFLINE` - three consecutive poll failures.
//!
//! # Implementation Note
//!
//! `run()` owns setup and teardown; the frame loop itself lives in
//! `render_loop()` so teardown always runs in order (cancel the poller,
//! restore the terminal, join the poll thread) even when a draw call fails.

use std::thread;
use std::time::{Duration, Instant};

use crate::chart::config::to_color;
use crate::chart::{SharedChart, new_shared};
use crate::cli::Cli;
use crate::net::poller;
use crate::net::{CancelToken, HttpSource, SimSource, TelemetrySource};
use crate::panels::{ChartPanel, ParagraphPanel, StatusPanel, TitlePanel};
use crate::ui::{Node, group, leaf};

use color_eyre::eyre::Result;
use ratatui::style::Color;

/// Target cadence of the render loop, roughly 30 frames per second.
const FRAME_TIME: Duration = Duration::from_millis(33);

/// App lifecycle. `Stopped` is terminal; a stopped app is torn down and
/// never re-entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

/// Build the frame's layout tree: title bar, chart beside the uplink
/// panel, controls row at the bottom.
fn build_tree(shared: &SharedChart, accent: Color) -> Node {
    group(
        ratatui::layout::Direction::Vertical,
        vec![
            ratatui::layout::Constraint::Length(3),
            ratatui::layout::Constraint::Min(10),
            ratatui::layout::Constraint::Length(3),
        ],
        vec![
            leaf(TitlePanel::new("Live Latency Telemetry", accent)),
            group(
                ratatui::layout::Direction::Horizontal,
                vec![
                    ratatui::layout::Constraint::Min(40),
                    ratatui::layout::Constraint::Length(46),
                ],
                vec![
                    leaf(ChartPanel::new(shared.clone())),
                    leaf(StatusPanel::new(shared.clone())),
                ],
            ),
            leaf(ParagraphPanel::dimmed(
                "Q=Quit  Esc=Quit  G=Toggle grid",
                "Controls",
            )),
        ],
    )
}

fn render_loop(
    terminal: &mut ratatui::DefaultTerminal,
    shared: &SharedChart,
    lifecycle: &mut Lifecycle,
    accent: Color,
) -> Result<()> {
    while *lifecycle == Lifecycle::Running {
        let frame_start = Instant::now();

        let root = build_tree(shared, accent);
        terminal.draw(|f| root.draw(f, f.area()))?;

        // Keyboard controls
        while crossterm::event::poll(Duration::from_millis(0))? {
            if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
                if key.kind != crossterm::event::KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    crossterm::event::KeyCode::Char('q') | crossterm::event::KeyCode::Esc => {
                        *lifecycle = Lifecycle::Stopped;
                    }
                    crossterm::event::KeyCode::Char('g') => {
                        let mut chart = shared.write().unwrap();
                        chart.show_grid = !chart.show_grid;
                        log::debug!("grid toggled to {}", chart.show_grid);
                    }
                    _ => {}
                }
            }
        }

        if *lifecycle != Lifecycle::Running {
            break;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.chart_config()?;
    let interval = cli.poll_interval();
    let accent = to_color(config.theme.stroke_head);

    // Ingestion source
    let source: Box<dyn TelemetrySource> = if cli.simulate {
        Box::new(SimSource::new())
    } else {
        Box::new(HttpSource::new(&cli.url, interval)?)
    };
    let label = source.label();

    let shared: SharedChart = new_shared(config, interval, label);
    shared.write().unwrap().show_grid = !cli.no_grid;

    let cancel = CancelToken::new();
    let poller = poller::spawn(source, shared.clone(), interval, cancel.clone());

    let mut lifecycle = Lifecycle::Idle;
    log::debug!("app {:?}", lifecycle);

    // UI setup
    let mut terminal = ratatui::init();
    lifecycle = Lifecycle::Running;
    log::info!(
        "app {:?}, frame time {} ms, poll interval {} ms",
        lifecycle,
        FRAME_TIME.as_millis(),
        interval.as_millis()
    );

    let outcome = render_loop(&mut terminal, &shared, &mut lifecycle, accent);

    // Teardown: hand the terminal back first; a stalled fetch can hold the
    // poll thread for its full timeout, and late pushes land in shared state
    // nobody reads anymore.
    cancel.cancel();
    ratatui::restore();
    if poller.join().is_err() {
        log::warn!("poller thread panicked");
    }
    lifecycle = Lifecycle::Stopped;
    log::info!("app {:?}", lifecycle);

    outcome
}
