//! Advisory seasonality diagnostics for the training window.

pub mod detection;

use chrono::Duration;
use tracing::{debug, warn};

use crate::common::params::ForecastParams;
use crate::common::types::Series;
use detection::{detect_cycles, strength_at_period, MIN_DETECTION_POINTS};

/// A detected cycle this strong is worth reporting when uncovered.
const STRONG_CYCLE_THRESHOLD: f64 = 0.3;

/// Relative mismatch tolerated between a detected and a configured period.
const PERIOD_MATCH_TOLERANCE: f64 = 0.2;

/// Scan the training window against the configured seasonality.
///
/// Emits `tracing` diagnostics only; never fails the pipeline. Warns when
/// an enabled component cannot be resolved from the window's span, and
/// when the data carries a strong cycle no enabled component covers.
pub fn check_seasonality(train: &Series, params: &ForecastParams) {
    let (Some(first), Some(last)) = (train.first_timestamp(), train.last_timestamp()) else {
        return;
    };
    let span = last - first;

    if params.daily_seasonality && span < Duration::days(1) {
        warn!(
            span_hours = span.num_hours(),
            "training window spans less than one day; the daily component cannot be resolved"
        );
    }
    if params.weekly_seasonality && span < Duration::days(7) {
        warn!(
            span_hours = span.num_hours(),
            "training window spans less than one week; the weekly component will be poorly resolved"
        );
    }

    let values = train.values();
    if values.len() < MIN_DETECTION_POINTS {
        return;
    }

    let interval_seconds = params.sampling_interval.num_seconds();
    if interval_seconds <= 0 {
        return;
    }
    let daily_period = Duration::days(1).num_seconds() as f64 / interval_seconds as f64;
    let weekly_period = Duration::days(7).num_seconds() as f64 / interval_seconds as f64;

    if params.daily_seasonality {
        let strength = strength_at_period(&values, daily_period.round() as usize);
        debug!(period = daily_period.round() as u64, strength, "daily cycle support");
    }
    if params.weekly_seasonality {
        let strength = strength_at_period(&values, weekly_period.round() as usize);
        debug!(period = weekly_period.round() as u64, strength, "weekly cycle support");
    }

    let cycles = detect_cycles(&values);
    let Some(best) = cycles.first().copied() else {
        return;
    };
    if best.strength <= STRONG_CYCLE_THRESHOLD {
        return;
    }

    let covered = (params.daily_seasonality && period_matches(best.period, daily_period))
        || (params.weekly_seasonality && period_matches(best.period, weekly_period));
    if !covered {
        warn!(
            period = best.period,
            strength = best.strength,
            "dominant cycle in the training window is not covered by the enabled seasonal \
             components"
        );
    }
}

fn period_matches(detected: u32, configured: f64) -> bool {
    if configured <= 0.0 {
        return false;
    }
    (detected as f64 - configured).abs() / configured <= PERIOD_MATCH_TOLERANCE
}
