//! src/chart.rs
//!
//! Top-level `chart` module: configuration, sample storage, projection and
//! spline geometry, plus the shared state handle.

pub mod config;
pub mod project;
pub mod sample;
pub mod shared;
pub mod spline;

/// Re-exports
pub use config::{ChartConfig, Theme};
pub use sample::Sample;
pub use shared::{LinkState, SharedChart, new_shared};
