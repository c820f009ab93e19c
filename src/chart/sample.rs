//! src/chart/sample.rs
//!
//! Time-ordered sample storage with a bounded retention window.
//!
//! The buffer has exactly one writer (the poll thread appends) and one
//! pruner (the render path trims by age each frame). The render path never
//! iterates the live deque; it takes an owned snapshot so an append can
//! never tear a frame mid-iteration.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;

/// One observed telemetry reading. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Observed latency in milliseconds.
    pub value: f64,
    /// Monotonic time the reading entered the buffer.
    pub at: Instant,
}

impl Sample {
    pub fn new(value: f64, at: Instant) -> Self {
        Self { value, at }
    }
}

/// Rejected append: the offered sample is older than the newest stored one.
/// This is a caller defect (the writer must push in time order), so it is
/// returned rather than swallowed.
#[derive(Debug, Error, PartialEq)]
#[error("out-of-order sample: offered timestamp lags the newest by {lag:?}")]
pub struct OutOfOrderSample {
    pub lag: Duration,
}

/// Ordered sequence of samples, oldest at the front.
///
/// Memory is bounded by the retention window over the poll cadence, not by a
/// fixed count: a burst of rapid samples is kept only as long as it stays
/// inside the window.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The most recent sample, if any.
    pub fn newest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    /// Append a sample. Timestamps must be non-decreasing; an older sample
    /// is rejected with [`OutOfOrderSample`].
    pub fn push(&mut self, sample: Sample) -> Result<(), OutOfOrderSample> {
        if let Some(last) = self.samples.back() {
            if sample.at < last.at {
                return Err(OutOfOrderSample {
                    lag: last.at.duration_since(sample.at),
                });
            }
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// Drop the prefix of samples older than `cutoff`, in O(evicted).
    ///
    /// The newest sample is always retained, even when it is older than the
    /// cutoff, so the live head always has a value to project from.
    pub fn prune(&mut self, cutoff: Instant) {
        while self.samples.len() > 1 {
            match self.samples.front() {
                Some(front) if front.at < cutoff => {
                    self.samples.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Owned point-in-time copy for the render path. Later appends do not
    /// affect a snapshot already taken.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}

/// Min/avg/max over a snapshot, used by the readout row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub last: f64,
}

/// Summarize a snapshot; `None` when it is empty.
pub fn summarize(samples: &[Sample]) -> Option<Summary> {
    let last = samples.last()?.value;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for s in samples {
        min = min.min(s.value);
        max = max.max(s.value);
        sum += s.value;
    }
    Some(Summary {
        min,
        avg: sum / samples.len() as f64,
        max,
        last,
    })
}
