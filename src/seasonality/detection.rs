//! Cycle detection over an availability series.
//!
//! Two-stage approach: a periodogram proposes candidate cycle lengths from
//! the frequency domain, then autocorrelation at each candidate produces a
//! strength that is interpretable as 0.0 (no cycle) to 1.0 (perfect
//! periodicity). Detection is advisory: the forecaster's seasonal
//! components are chosen by configuration, and this scan only powers the
//! pre-fit diagnostics.

use augurs_seasons::PeriodogramDetector;

/// A detected cycle, measured in samples at the ingestion cadence
/// (96 samples = one day of 15-minute readings).
#[derive(Debug, Clone, Copy)]
pub struct DetectedCycle {
    /// Cycle length in samples.
    pub period: u32,
    /// Autocorrelation strength, clamped to 0.0 - 1.0.
    pub strength: f64,
}

/// Minimum number of observations for cycle detection to be attempted.
/// Below this there is no room for even two short cycles.
pub const MIN_DETECTION_POINTS: usize = 8;

/// Minimum spectral power (as a fraction of the maximum) for a candidate.
const PERIODOGRAM_POWER_THRESHOLD: f64 = 0.01;

/// Cap on candidates validated with autocorrelation.
const MAX_CANDIDATES: usize = 20;

/// Autocorrelation below this is treated as no cycle.
const MIN_CYCLE_STRENGTH: f64 = 0.1;

/// Detect cyclic structure in an availability series.
///
/// Returns detected cycles sorted by descending strength. The result is
/// empty when the series is too short, constant, or carries no measurable
/// periodicity; an advisory scan has no error to report.
pub fn detect_cycles(values: &[f64]) -> Vec<DetectedCycle> {
    if values.len() < MIN_DETECTION_POINTS {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    if variance < 1e-10 {
        return Vec::new();
    }

    // Stage 1: candidate periods from the periodogram. The threshold is
    // deliberately low; autocorrelation does the real filtering.
    let max_period = (values.len() / 2) as u32;
    let detector = PeriodogramDetector::builder()
        .min_period(2)
        .max_period(max_period)
        .build();
    let periodogram = detector.periodogram(values);

    let max_power = periodogram
        .powers
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    if max_power <= 0.0 || !max_power.is_finite() {
        return Vec::new();
    }

    let mut candidates: Vec<(u32, f64)> = periodogram
        .periods
        .iter()
        .zip(periodogram.powers.iter())
        .filter(|(_, &power)| power > max_power * PERIODOGRAM_POWER_THRESHOLD)
        .map(|(&period, &power)| (period, power))
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(MAX_CANDIDATES);

    // Stage 2: validate each candidate with autocorrelation.
    let mut cycles: Vec<DetectedCycle> = candidates
        .into_iter()
        .filter_map(|(period, _power)| {
            let strength = autocorrelation_at_lag(values, period as usize, mean, variance);
            if strength > MIN_CYCLE_STRENGTH {
                Some(DetectedCycle { period, strength: strength.clamp(0.0, 1.0) })
            } else {
                None
            }
        })
        .collect();

    cycles.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    cycles
}

/// Autocorrelation strength of one configured cycle length.
///
/// Returns 0.0 when the series cannot support the lag (too short, constant,
/// or anti-correlated at that lag).
pub fn strength_at_period(values: &[f64], period: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    if variance < 1e-10 {
        return 0.0;
    }
    autocorrelation_at_lag(values, period, mean, variance).clamp(0.0, 1.0)
}

/// Autocorrelation of the series at a specific lag, in -1.0 to 1.0.
fn autocorrelation_at_lag(values: &[f64], lag: usize, mean: f64, variance: f64) -> f64 {
    if lag == 0 || lag >= values.len() || variance < 1e-10 {
        return 0.0;
    }

    let valid_pairs = (values.len() - lag) as f64;
    let covariance: f64 = values[..values.len() - lag]
        .iter()
        .zip(values[lag..].iter())
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum::<f64>()
        / valid_pairs;

    covariance / variance
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Ten days of 15-minute samples with a clean daily cycle.
    fn daily_cycle_series() -> Vec<f64> {
        (0..960)
            .map(|i| 50.0 + 20.0 * (2.0 * PI * i as f64 / 96.0).sin())
            .collect()
    }

    #[test]
    fn test_daily_cycle_detected_in_quarter_hour_samples() {
        let cycles = detect_cycles(&daily_cycle_series());
        assert!(!cycles.is_empty(), "should detect at least one cycle");
        let has_daily = cycles
            .iter()
            .any(|c| (90..=102).contains(&c.period) && c.strength > 0.5);
        assert!(
            has_daily,
            "should detect a strong ~96-sample cycle, got: {cycles:?}"
        );
    }

    #[test]
    fn test_constant_series_has_no_cycles() {
        let values = vec![42.0; 200];
        assert!(detect_cycles(&values).is_empty());
    }

    #[test]
    fn test_too_few_points_yields_nothing() {
        let values = vec![1.0, 5.0, 1.0];
        assert!(detect_cycles(&values).is_empty());
    }

    #[test]
    fn test_linear_trend_has_no_strong_cycle() {
        let values: Vec<f64> = (0..200).map(|i| 10.0 + 0.5 * i as f64).collect();
        let cycles = detect_cycles(&values);
        assert!(
            cycles.is_empty() || cycles[0].strength < 0.5,
            "pure trend should not read as strong seasonality, got: {cycles:?}"
        );
    }

    #[test]
    fn test_strength_is_bounded() {
        for cycle in detect_cycles(&daily_cycle_series()) {
            assert!(cycle.strength >= 0.0, "strength below 0: {cycle:?}");
            assert!(cycle.strength <= 1.0, "strength above 1: {cycle:?}");
        }
    }

    #[test]
    fn test_strength_at_configured_period() {
        let values = daily_cycle_series();
        let at_cycle = strength_at_period(&values, 96);
        let off_cycle = strength_at_period(&values, 48);
        assert!(at_cycle > 0.9, "on-period strength was {at_cycle}");
        // Half a period away the series is anti-correlated, which clamps to 0.
        assert!(off_cycle < 0.1, "off-period strength was {off_cycle}");
    }

    #[test]
    fn test_strength_at_unsupported_lag_is_zero() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(strength_at_period(&values, 0), 0.0);
        assert_eq!(strength_at_period(&values, 10), 0.0);
        assert_eq!(strength_at_period(&[], 5), 0.0);
    }
}
