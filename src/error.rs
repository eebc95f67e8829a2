use chrono::NaiveDateTime;
use thiserror::Error;

/// The unified error type for the forecasting pipeline.
///
/// Every stage validates its own preconditions and fails fast with one of
/// these kinds; no stage substitutes defaults for invalid input. A pipeline
/// run either returns the full forecast or exactly one of these errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A record's timestamp or availability value could not be parsed or
    /// coerced. `index` is the record's position in the caller's input.
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// The input contained no readings at all.
    #[error("input contains no readings")]
    InsufficientData,

    /// The training window is empty: every reading lies after the cutoff,
    /// so there is nothing to fit a model on.
    #[error("no readings at or before the train/test cutoff {cutoff}")]
    InsufficientTrainingData { cutoff: NaiveDateTime },

    /// The seasonal model could not be fitted: too few observations for the
    /// configured seasonality, a singular design, or non-finite results.
    /// Never retried; the fit is deterministic for a fixed input.
    #[error("seasonal model fit failed: {reason}")]
    ModelFit { reason: String },

    /// The prediction curve has no value for a required test timestamp.
    /// Signals a horizon/interval mismatch, not a transient condition.
    #[error("no predicted value for test timestamp {timestamp}")]
    TimestampAlignment { timestamp: NaiveDateTime },
}
