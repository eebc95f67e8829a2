use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// A single availability observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// Naive wall-clock timestamp; any offset is stripped at ingestion.
    pub timestamp: NaiveDateTime,
    /// Number of available lots. Never negative.
    pub available: i64,
}

/// A time-ordered series of availability readings.
///
/// Sorted ascending by timestamp after ingestion; readings with equal
/// timestamps keep their input order.
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub readings: Vec<Reading>,
}

impl Series {
    /// Returns the number of readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns true if the series has no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Returns the earliest timestamp, or None if empty.
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.first().map(|r| r.timestamp)
    }

    /// Returns the latest timestamp, or None if empty.
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.last().map(|r| r.timestamp)
    }

    /// Availability values as f64, in timestamp order.
    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.available as f64).collect()
    }

    /// Timestamps in order.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).collect()
    }
}

/// A partition of a series into a fitting window and a held-out window.
#[derive(Debug, Clone)]
pub struct Split {
    /// `last_timestamp - lookback`. A reading exactly at the cutoff lands
    /// in both subsets.
    pub cutoff: NaiveDateTime,
    /// Readings at or before the cutoff.
    pub train: Series,
    /// Readings at or after the cutoff.
    pub test: Series,
}

/// The raw output of the forecaster: one predicted value (with interval
/// bounds) per curve timestamp.
///
/// The curve covers every training timestamp (in-sample fitted values)
/// followed by the generated future grid points, so the projector can
/// resolve any test timestamp by exact match, including a boundary reading
/// shared with the training window.
#[derive(Debug, Clone)]
pub struct PredictionCurve {
    pub timestamps: Vec<NaiveDateTime>,
    /// Point predictions.
    pub predicted: Vec<f64>,
    /// Lower prediction interval bounds.
    pub lower_bounds: Vec<f64>,
    /// Upper prediction interval bounds.
    pub upper_bounds: Vec<f64>,
}

impl PredictionCurve {
    /// Returns the number of curve points.
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    /// Returns true if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// One forecast record in the caller's output shape.
///
/// `available` is rounded to one decimal place; serde serialization yields
/// an ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    pub timestamp: NaiveDateTime,
    pub available: f64,
}

/// Detect the dominant interval between consecutive readings.
///
/// Returns the mode of the consecutive timestamp differences, or None if
/// there are fewer than two readings or no positive difference exists
/// (e.g. every reading shares one timestamp).
pub fn observed_interval(timestamps: &[NaiveDateTime]) -> Option<Duration> {
    if timestamps.len() < 2 {
        return None;
    }

    let mut diffs: Vec<Duration> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    diffs.sort_unstable();

    let mut best_val = diffs[0];
    let mut best_count = 1usize;
    let mut current_val = diffs[0];
    let mut current_count = 1usize;

    for &d in &diffs[1..] {
        if d == current_val {
            current_count += 1;
        } else {
            if current_count > best_count {
                best_count = current_count;
                best_val = current_val;
            }
            current_val = d;
            current_count = 1;
        }
    }
    if current_count > best_count {
        best_val = current_val;
    }

    if best_val <= Duration::zero() {
        return None;
    }

    Some(best_val)
}
