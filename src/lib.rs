//! Seasonal forecasting of parking availability time series.
//!
//! Given a history of timestamped occupancy-availability readings for a
//! parking facility, the pipeline predicts availability over the most
//! recent lookback window (default 24 hours) at a fixed sampling interval
//! (default 15 minutes):
//!
//! 1. [`ingest`] parses raw JSON records into a sorted, offset-free
//!    [`Series`].
//! 2. [`partition`] splits the series at `last_timestamp - lookback` into
//!    fitting and evaluation windows.
//! 3. [`forecast::models`] fits an additive trend + daily + weekly Fourier
//!    regression to the fitting window and predicts over the evaluation
//!    range; [`seasonality`] runs advisory diagnostics beforehand.
//! 4. [`forecast::project`] aligns predictions to the evaluation window's
//!    exact timestamps and rounds them to one decimal place.
//!
//! The caller-facing operation is [`forecast_availability`], configured
//! through [`ForecastParams`]. A call either returns the full forecast or
//! one [`PipelineError`]; it never returns partial output and holds no
//! state between invocations, so concurrent calls are independent.

pub mod common;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod partition;
pub mod seasonality;

pub use common::params::{ConfigError, DuplicatePolicy, ForecastParams};
pub use common::types::{ForecastRecord, PredictionCurve, Reading, Series, Split};
pub use error::PipelineError;
pub use forecast::forecast_availability;
