//! Pipeline orchestration: the one caller-facing operation.

pub mod models;
pub mod project;

use serde_json::Value;
use tracing::debug;

use crate::common::params::ForecastParams;
use crate::common::types::ForecastRecord;
use crate::error::PipelineError;
use crate::{ingest, partition, seasonality};

/// Run the full forecasting pipeline over raw reading records.
///
/// Stages, strictly in order: ingestion & normalization, train/test
/// partitioning at the configured lookback, additive seasonal model fit
/// over the training window, and projection of predicted values onto the
/// evaluation window's timestamps.
///
/// The call is atomic: it returns one forecast record per test reading
/// (same timestamps, same order, values rounded to one decimal) or exactly
/// one [`PipelineError`]; never a partial forecast. Each invocation owns
/// its series, split, and model, so concurrent invocations are
/// independent.
pub fn forecast_availability(
    records: &[Value],
    params: &ForecastParams,
) -> Result<Vec<ForecastRecord>, PipelineError> {
    let series = ingest::read_readings(records, params)?;
    let split = partition::split_at_lookback(&series, params.lookback)?;

    seasonality::check_seasonality(&split.train, params);

    let model = models::fit_additive(&split.train, params)?;

    // Zero horizon: the fit has validated the training window, but no
    // prediction machinery runs.
    if split.test.is_empty() {
        return Ok(Vec::new());
    }

    let curve = models::predict_curve(&model, &split.train, split.test.len(), params)?;
    let forecast = project::project(&curve, &split.test)?;

    debug!(horizon = forecast.len(), "forecast complete");
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use serde_json::json;
    use std::f64::consts::PI;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Records on the 15-minute grid with values from `value_at`.
    fn grid_records(count: usize, value_at: impl Fn(usize) -> i64) -> Vec<Value> {
        (0..count)
            .map(|i| {
                let timestamp = base() + Duration::minutes(15 * i as i64);
                json!({
                    "timestamp": timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "available": value_at(i),
                })
            })
            .collect()
    }

    #[test]
    fn test_scenario_constant_series_forecasts_flat() {
        // Eight days of constant availability: the last day's forecast is
        // exactly 5.0 everywhere.
        let records = grid_records(8 * 96 + 1, |_| 5);
        let params = ForecastParams::default();
        let forecast = forecast_availability(&records, &params).unwrap();

        assert_eq!(forecast.len(), 97, "24 hours of 15-minute points, boundary included");
        for record in &forecast {
            assert_eq!(
                record.available, 5.0,
                "constant series should forecast 5.0 at {}",
                record.timestamp
            );
        }
    }

    #[test]
    fn test_scenario_empty_input_fails() {
        let err = forecast_availability(&[], &ForecastParams::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData));
    }

    #[test]
    fn test_scenario_one_hour_of_history_fails() {
        let records = grid_records(5, |_| 5);
        let err = forecast_availability(&records, &ForecastParams::default()).unwrap_err();
        assert!(
            matches!(err, PipelineError::InsufficientTrainingData { .. }),
            "error: {err}"
        );
    }

    #[test]
    fn test_scenario_daily_pattern_is_reproduced() {
        // Two weeks, busy during the day: availability peaks at night
        // (30 at midnight) and bottoms out at midday (10 at noon).
        let cycle = |i: usize| {
            (20.0 + 10.0 * (2.0 * PI * (i % 96) as f64 / 96.0).cos()).round() as i64
        };
        let records = grid_records(14 * 96 + 1, cycle);
        let params = ForecastParams::default();
        let forecast = forecast_availability(&records, &params).unwrap();

        assert_eq!(forecast.len(), 97);

        let midnights: Vec<f64> = forecast
            .iter()
            .filter(|r| r.timestamp.format("%H:%M").to_string() == "00:00")
            .map(|r| r.available)
            .collect();
        let middays: Vec<f64> = forecast
            .iter()
            .filter(|r| r.timestamp.format("%H:%M").to_string() == "12:00")
            .map(|r| r.available)
            .collect();
        assert!(!midnights.is_empty() && !middays.is_empty());

        for &night in &midnights {
            for &day in &middays {
                assert!(
                    night - day > 15.0,
                    "daily pattern should survive: midnight {night} vs midday {day}"
                );
            }
        }

        let max = forecast.iter().map(|r| r.available).fold(f64::MIN, f64::max);
        let min = forecast.iter().map(|r| r.available).fold(f64::MAX, f64::min);
        assert!(max - min > 15.0, "forecast should not be flat: {min}..{max}");
    }

    #[test]
    fn test_forecast_timestamps_mirror_test_window() {
        let records = grid_records(8 * 96 + 1, |i| (i % 7) as i64);
        let params = ForecastParams::default();
        let forecast = forecast_availability(&records, &params).unwrap();

        // The test window is the final 24 hours, boundary included.
        let last = base() + Duration::minutes(15 * (8 * 96) as i64);
        let cutoff = last - Duration::hours(24);
        for (i, record) in forecast.iter().enumerate() {
            assert_eq!(record.timestamp, cutoff + Duration::minutes(15 * i as i64));
        }
    }

    #[test]
    fn test_malformed_record_fails_atomically() {
        let mut records = grid_records(8 * 96 + 1, |_| 5);
        records[100] = json!({"timestamp": "not-a-time", "available": 5});
        let err = forecast_availability(&records, &ForecastParams::default()).unwrap_err();
        match err {
            PipelineError::MalformedRecord { index, .. } => assert_eq!(index, 100),
            other => panic!("expected MalformedRecord, got {other}"),
        }
    }

    #[test]
    fn test_off_grid_test_window_fails_alignment() {
        // Seven days on the grid, then 24 hours of readings every 20
        // minutes: the evaluation window drifts off the 15-minute grid.
        let mut records = grid_records(7 * 96 + 1, |_| 5);
        let grid_end = base() + Duration::minutes(15 * (7 * 96) as i64);
        for i in 1..=72 {
            let timestamp = grid_end + Duration::minutes(20 * i as i64);
            records.push(json!({
                "timestamp": timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "available": 5,
            }));
        }

        let err = forecast_availability(&records, &ForecastParams::default()).unwrap_err();
        assert!(
            matches!(err, PipelineError::TimestampAlignment { .. }),
            "error: {err}"
        );
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let cycle = |i: usize| {
            (20.0 + 10.0 * (2.0 * PI * (i % 96) as f64 / 96.0).cos()).round() as i64
        };
        let records = grid_records(14 * 96 + 1, cycle);
        let params = ForecastParams::default();

        let first = forecast_availability(&records, &params).unwrap();
        let second = forecast_availability(&records, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_values_carry_one_decimal() {
        let cycle = |i: usize| {
            (20.0 + 10.0 * (2.0 * PI * (i % 96) as f64 / 96.0).cos()).round() as i64
        };
        let records = grid_records(14 * 96 + 1, cycle);
        let forecast =
            forecast_availability(&records, &ForecastParams::default()).unwrap();
        for record in &forecast {
            let tenths = record.available * 10.0;
            assert!(
                (tenths - tenths.round()).abs() < 1e-9,
                "{} is not rounded to one decimal",
                record.available
            );
        }
    }

    #[test]
    fn test_custom_field_names_flow_through() {
        let records: Vec<Value> = (0..(8 * 96 + 1))
            .map(|i| {
                let timestamp = base() + Duration::minutes(15 * i as i64);
                json!({
                    "recorded_at": timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "lots_available": 5,
                })
            })
            .collect();
        let params = ForecastParams {
            timestamp_field: "recorded_at".to_string(),
            value_field: "lots_available".to_string(),
            ..Default::default()
        };
        let forecast = forecast_availability(&records, &params).unwrap();
        assert_eq!(forecast.len(), 97);
    }
}
