//! Result projection: align predicted values to the evaluation window.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::common::types::{ForecastRecord, PredictionCurve, Series};
use crate::error::PipelineError;

/// Decimal places kept in caller-facing forecast values.
const FORECAST_DECIMALS: i32 = 1;

/// Project the prediction curve onto the test window.
///
/// Every test timestamp must match a curve timestamp exactly (no
/// nearest-neighbor snapping); a miss fails with
/// [`PipelineError::TimestampAlignment`] and no partial output. Values are
/// rounded to one decimal and returned in test order, one record per test
/// reading (duplicate test timestamps each get the same predicted value).
pub fn project(
    curve: &PredictionCurve,
    test: &Series,
) -> Result<Vec<ForecastRecord>, PipelineError> {
    let lookup: BTreeMap<NaiveDateTime, f64> = curve
        .timestamps
        .iter()
        .copied()
        .zip(curve.predicted.iter().copied())
        .collect();

    let mut records = Vec::with_capacity(test.len());
    for reading in &test.readings {
        let predicted = lookup
            .get(&reading.timestamp)
            .copied()
            .ok_or(PipelineError::TimestampAlignment { timestamp: reading.timestamp })?;
        records.push(ForecastRecord {
            timestamp: reading.timestamp,
            available: round_forecast(predicted),
        });
    }
    Ok(records)
}

/// Round to one decimal place, ties to even.
fn round_forecast(value: f64) -> f64 {
    let scale = 10f64.powi(FORECAST_DECIMALS);
    (value * scale).round_ties_even() / scale
}
