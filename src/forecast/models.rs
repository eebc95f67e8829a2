//! The additive seasonal regression model.
//!
//! Availability is modeled as `trend + daily effect + weekly effect`: a
//! linear trend in elapsed time plus Fourier terms at the daily and weekly
//! periods, fitted jointly by ordinary least squares. The components are
//! summed, never multiplied. OLS is closed-form, so a fit on fixed input
//! always produces identical coefficients.

use std::f64::consts::PI;

use chrono::NaiveDateTime;
use linregress::{FormulaRegressionBuilder, RegressionDataBuilder};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::common::params::ForecastParams;
use crate::common::types::{PredictionCurve, Series};
use crate::error::PipelineError;

/// Fourier order of the daily component.
pub const DAILY_FOURIER_ORDER: usize = 4;

/// Fourier order of the weekly component.
pub const WEEKLY_FOURIER_ORDER: usize = 3;

/// Period of the daily component, in days of elapsed time.
const DAILY_PERIOD_DAYS: f64 = 1.0;

/// Period of the weekly component, in days of elapsed time.
const WEEKLY_PERIOD_DAYS: f64 = 7.0;

/// Residual standard error below which the fit is treated as exact and
/// prediction intervals collapse to the point forecast.
const NEAR_PERFECT_SE: f64 = 1e-10;

/// A fitted additive seasonal model.
///
/// Prediction is a dot product of the OLS coefficients with the design row
/// for a timestamp; no state beyond the coefficients survives the fit.
#[derive(Debug, Clone)]
pub struct FittedSeasonalModel {
    /// Timestamp mapped to elapsed time zero.
    origin: NaiveDateTime,
    /// `[intercept, trend, seasonal terms...]` in design-column order.
    coefficients: Vec<f64>,
    daily: bool,
    weekly: bool,
    /// Residual standard error of the fit.
    residual_se: f64,
    /// Residual degrees of freedom (observations minus parameters).
    df: f64,
    n_train: usize,
}

impl FittedSeasonalModel {
    /// Predicted availability at a timestamp.
    pub fn predict_at(&self, timestamp: NaiveDateTime) -> f64 {
        let x = elapsed_days(self.origin, timestamp);
        let mut value = self.coefficients[0] + self.coefficients[1] * x;
        for (coefficient, term) in self.coefficients[2..]
            .iter()
            .zip(fourier_terms(x, self.daily, self.weekly))
        {
            value += coefficient * term;
        }
        value
    }
}

/// Minimum training observations needed to fit the configured model.
pub fn min_train_points(params: &ForecastParams) -> usize {
    parameter_count(params.daily_seasonality, params.weekly_seasonality) + 2
}

/// Fit the additive seasonal model to the training window.
///
/// Fails with [`PipelineError::ModelFit`] when the window is smaller than
/// the parameter count allows, when the design is singular (e.g. a window
/// far shorter than an enabled period), or when the fit produces
/// non-finite coefficients.
pub fn fit_additive(
    train: &Series,
    params: &ForecastParams,
) -> Result<FittedSeasonalModel, PipelineError> {
    let n = train.len();
    let minimum = min_train_points(params);
    if n < minimum {
        return Err(PipelineError::ModelFit {
            reason: format!(
                "need at least {minimum} training observations for the configured \
                 seasonality, got {n}"
            ),
        });
    }

    let origin = train.first_timestamp().ok_or_else(|| PipelineError::ModelFit {
        reason: "training window has no timestamps".to_string(),
    })?;

    let daily = params.daily_seasonality;
    let weekly = params.weekly_seasonality;

    let x: Vec<f64> = train
        .readings
        .iter()
        .map(|r| elapsed_days(origin, r.timestamp))
        .collect();

    let names = regressor_names(daily, weekly);
    let mut data: Vec<(String, Vec<f64>)> = Vec::with_capacity(names.len() + 1);
    data.push(("y".to_string(), train.values()));
    data.push(("t".to_string(), x.clone()));

    // Seasonal columns in the same order fourier_terms emits them.
    let mut seasonal_columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); names.len() - 1];
    for &xi in &x {
        for (column, term) in seasonal_columns.iter_mut().zip(fourier_terms(xi, daily, weekly)) {
            column.push(term);
        }
    }
    for (name, column) in names.iter().skip(1).zip(seasonal_columns) {
        data.push((name.clone(), column));
    }

    let formula = format!("y ~ {}", names.join(" + "));
    let regression_data = RegressionDataBuilder::new().build_from(data).map_err(|e| {
        PipelineError::ModelFit { reason: format!("failed to build regression data: {e}") }
    })?;
    let model = FormulaRegressionBuilder::new()
        .data(&regression_data)
        .formula(formula.as_str())
        .fit()
        .map_err(|e| PipelineError::ModelFit {
            reason: format!("least-squares fit failed: {e}"),
        })?;

    let coefficients = model.parameters().to_vec();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(PipelineError::ModelFit {
            reason: "fit produced non-finite coefficients".to_string(),
        });
    }

    let p = coefficients.len();
    let df = (n - p) as f64;
    let residual_se = model.scale().sqrt();

    debug!(n_train = n, parameters = p, residual_se, "fitted additive seasonal model");

    Ok(FittedSeasonalModel {
        origin,
        coefficients,
        daily,
        weekly,
        residual_se,
        df,
        n_train: n,
    })
}

/// Build the prediction curve: in-sample fitted values for every training
/// timestamp, then `horizon` future points spaced one sampling interval
/// apart starting immediately after the training window's last timestamp.
pub fn predict_curve(
    model: &FittedSeasonalModel,
    train: &Series,
    horizon: usize,
    params: &ForecastParams,
) -> Result<PredictionCurve, PipelineError> {
    let last = train.last_timestamp().ok_or_else(|| PipelineError::ModelFit {
        reason: "training window has no timestamps".to_string(),
    })?;

    let mut timestamps = train.timestamps();
    timestamps.reserve(horizon);
    for i in 1..=horizon {
        timestamps.push(last + params.sampling_interval * i as i32);
    }

    let half_width = interval_half_width(model, params.confidence_level)?;

    let mut predicted = Vec::with_capacity(timestamps.len());
    let mut lower_bounds = Vec::with_capacity(timestamps.len());
    let mut upper_bounds = Vec::with_capacity(timestamps.len());
    for &timestamp in &timestamps {
        let y_hat = model.predict_at(timestamp);
        if !y_hat.is_finite() {
            return Err(PipelineError::ModelFit {
                reason: format!("prediction at {timestamp} is not finite"),
            });
        }
        predicted.push(y_hat);
        lower_bounds.push(y_hat - half_width);
        upper_bounds.push(y_hat + half_width);
    }

    Ok(PredictionCurve { timestamps, predicted, lower_bounds, upper_bounds })
}

/// Half-width of the observation-level prediction interval.
///
/// `t * s * sqrt(1 + 1/n)` with the Student's t quantile at the configured
/// confidence level: observation noise plus the mean's own uncertainty,
/// constant across the curve (per-point leverage is not folded in).
fn interval_half_width(
    model: &FittedSeasonalModel,
    confidence_level: f64,
) -> Result<f64, PipelineError> {
    if model.residual_se < NEAR_PERFECT_SE {
        return Ok(0.0);
    }

    let t_dist = StudentsT::new(0.0, 1.0, model.df).map_err(|e| PipelineError::ModelFit {
        reason: format!("failed to build t-distribution: {e}"),
    })?;
    let alpha = 1.0 - confidence_level;
    let t_value = t_dist.inverse_cdf(1.0 - alpha / 2.0);

    let width = t_value * model.residual_se * (1.0 + 1.0 / model.n_train as f64).sqrt();
    if !width.is_finite() {
        return Err(PipelineError::ModelFit {
            reason: "prediction interval width is not finite".to_string(),
        });
    }
    Ok(width)
}

/// Seasonal design terms for one elapsed-time value `x` (in days), in
/// column order: daily sin/cos pairs by ascending order, then weekly.
fn fourier_terms(x: f64, daily: bool, weekly: bool) -> Vec<f64> {
    let mut terms =
        Vec::with_capacity(parameter_count(daily, weekly) - 2);
    if daily {
        for k in 1..=DAILY_FOURIER_ORDER {
            let angle = 2.0 * PI * k as f64 * x / DAILY_PERIOD_DAYS;
            terms.push(angle.sin());
            terms.push(angle.cos());
        }
    }
    if weekly {
        for k in 1..=WEEKLY_FOURIER_ORDER {
            let angle = 2.0 * PI * k as f64 * x / WEEKLY_PERIOD_DAYS;
            terms.push(angle.sin());
            terms.push(angle.cos());
        }
    }
    terms
}

/// Regressor names in design-column order, trend first.
fn regressor_names(daily: bool, weekly: bool) -> Vec<String> {
    let mut names = vec!["t".to_string()];
    if daily {
        for k in 1..=DAILY_FOURIER_ORDER {
            names.push(format!("ds{k}"));
            names.push(format!("dc{k}"));
        }
    }
    if weekly {
        for k in 1..=WEEKLY_FOURIER_ORDER {
            names.push(format!("ws{k}"));
            names.push(format!("wc{k}"));
        }
    }
    names
}

/// Number of OLS parameters (intercept included) for a configuration.
fn parameter_count(daily: bool, weekly: bool) -> usize {
    let mut count = 2; // intercept + trend
    if daily {
        count += 2 * DAILY_FOURIER_ORDER;
    }
    if weekly {
        count += 2 * WEEKLY_FOURIER_ORDER;
    }
    count
}

/// Elapsed time between two timestamps, in fractional days.
fn elapsed_days(origin: NaiveDateTime, timestamp: NaiveDateTime) -> f64 {
    (timestamp - origin).num_milliseconds() as f64 / 86_400_000.0
}
