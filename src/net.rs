//! src/net.rs
//!
//! Top-level `net` module: payload decode and the poll thread.

pub mod payload;
pub mod poller;

/// Re-exports
pub use poller::{CancelToken, HttpSource, SimSource, TelemetrySource};
