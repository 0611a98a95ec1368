//! Temporal partitioning of pings.
//!
//! Pings older than `now - lag` describe where people *are* ("current");
//! anything newer feeds the "predicted" window.

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Default age threshold separating the two windows (2 hours).
pub const DEFAULT_PREDICTION_LAG_SECS: i64 = 2 * 60 * 60;

/// The two disjoint time windows a ping can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Current,
    Predicted,
}

impl TimeWindow {
    /// Key used for this window in the response payload.
    pub fn response_key(&self) -> &'static str {
        match self {
            TimeWindow::Current => "current",
            TimeWindow::Predicted => "predict",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.response_key())
    }
}

/// Cutoff timestamp for a query time and lag. Saturates instead of overflowing.
pub fn cutoff(now: i64, lag_secs: i64) -> i64 {
    now.saturating_sub(lag_secs)
}

/// Classify a single ping against a precomputed cutoff.
#[inline]
pub fn classify(point: &GeoPoint, cutoff: i64) -> TimeWindow {
    if point.timestamp < cutoff {
        TimeWindow::Current
    } else {
        TimeWindow::Predicted
    }
}

/// Pings split by time window, each preserving input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub current: Vec<GeoPoint>,
    pub predicted: Vec<GeoPoint>,
}

impl Partitions {
    pub fn window(&self, window: TimeWindow) -> &[GeoPoint] {
        match window {
            TimeWindow::Current => &self.current,
            TimeWindow::Predicted => &self.predicted,
        }
    }

    /// Total number of pings across both windows.
    pub fn len(&self) -> usize {
        self.current.len() + self.predicted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.predicted.is_empty()
    }
}

/// Split pings into current and predicted windows relative to `now`.
///
/// A ping with `timestamp < now - lag_secs` is current, every other ping is
/// predicted. Total over any `i64` timestamp.
pub fn partition_by_age(points: &[GeoPoint], now: i64, lag_secs: i64) -> Partitions {
    let cutoff = cutoff(now, lag_secs);
    let mut partitions = Partitions::default();

    for point in points {
        match classify(point, cutoff) {
            TimeWindow::Current => partitions.current.push(*point),
            TimeWindow::Predicted => partitions.predicted.push(*point),
        }
    }

    partitions
}
