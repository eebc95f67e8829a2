//! Train/test partitioning at a fixed lookback offset from the latest
//! reading.

use chrono::Duration;
use tracing::debug;

use crate::common::types::{Series, Split};
use crate::error::PipelineError;

/// Split a series at `last_timestamp - lookback`.
///
/// Readings at or before the cutoff form the training window; readings at
/// or after it form the evaluation window. A reading exactly at the cutoff
/// lands in BOTH windows: the boundary observation anchors the fit and is
/// also forecast.
///
/// Fails with [`PipelineError::InsufficientTrainingData`] when nothing
/// precedes the cutoff, and [`PipelineError::InsufficientData`] on an
/// empty series.
pub fn split_at_lookback(series: &Series, lookback: Duration) -> Result<Split, PipelineError> {
    let last = series.last_timestamp().ok_or(PipelineError::InsufficientData)?;
    let cutoff = last - lookback;

    let train = Series {
        readings: series
            .readings
            .iter()
            .filter(|r| r.timestamp <= cutoff)
            .cloned()
            .collect(),
    };
    let test = Series {
        readings: series
            .readings
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .cloned()
            .collect(),
    };

    if train.is_empty() {
        return Err(PipelineError::InsufficientTrainingData { cutoff });
    }

    debug!(
        train_len = train.len(),
        test_len = test.len(),
        %cutoff,
        "partitioned series"
    );

    Ok(Split { cutoff, train, test })
}
