//! src/net/payload.rs
//!
//! Typed decode of the polled telemetry payload.
//!
//! The endpoint answers in one of three shapes and callers never know which
//! one is in use:
//! - a bare array of records, ordered oldest to newest,
//! - an object carrying that array under a `history` field,
//! - a single object carrying only the latest reading.
//!
//! Array entries are either `{"latency": <number>, ...}` records or bare
//! numbers. Anything else is a malformed payload and decodes to an error
//! instead of being picked apart field by field.

use serde::Deserialize;
use thiserror::Error;

/// One poll cycle's outcome classification.
#[derive(Debug, Error)]
pub enum PollError {
    /// Request rejected, timed out, or the transport failed.
    #[error("request failed: {0}")]
    Network(String),
    /// Body arrived but is not telemetry (bad JSON, wrong shape, non-numeric
    /// value, missing field).
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PollError {
    fn from(e: reqwest::Error) -> Self {
        PollError::Network(e.to_string())
    }
}

/// Decoded payload, normalized to plain latency values in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum PollPayload {
    /// Full history, oldest first. May be empty.
    History(Vec<f64>),
    /// Single incremental reading.
    Latest(f64),
}

/// One array entry on the wire: a record with a `latency` field, or a bare
/// number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Record { latency: f64 },
    Bare(f64),
}

impl WireEntry {
    fn value(&self) -> f64 {
        match self {
            WireEntry::Record { latency } => *latency,
            WireEntry::Bare(v) => *v,
        }
    }
}

/// Top-level wire shapes, tried in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Wire {
    Array(Vec<WireEntry>),
    WithHistory { history: Vec<WireEntry> },
    Single { latency: f64 },
}

/// Decode a raw response body into a [`PollPayload`].
///
/// The body is parsed as JSON first so transport-level truncation and
/// non-JSON bodies classify as `Malformed`, not `Network`.
pub fn decode(body: &str) -> Result<PollPayload, PollError> {
    let wire: Wire = serde_json::from_str(body)
        .map_err(|e| PollError::Malformed(format!("unrecognized telemetry shape: {e}")))?;

    let payload = match wire {
        Wire::Array(entries) | Wire::WithHistory { history: entries } => {
            PollPayload::History(entries.iter().map(WireEntry::value).collect())
        }
        Wire::Single { latency } => PollPayload::Latest(latency),
    };
    Ok(payload)
}
