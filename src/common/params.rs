use chrono::Duration;
use serde_json::Value;
use thiserror::Error;

/// Default lookback separating the fitting window from the evaluation
/// window, in hours.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Default spacing of generated forecast timestamps, in minutes.
pub const DEFAULT_SAMPLING_MINUTES: i64 = 15;

/// Default confidence level for prediction interval bounds.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Default record field holding the timestamp.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "timestamp";

/// Default record field holding the availability count.
pub const DEFAULT_VALUE_FIELD: &str = "available";

/// How readings sharing a timestamp are handled after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep every reading, including exact-timestamp duplicates.
    #[default]
    KeepAll,
    /// Keep only the last reading (in input order) for each timestamp.
    LastWins,
    /// Fail ingestion when two readings share a timestamp.
    Reject,
}

/// Configuration-boundary errors, surfaced before the pipeline runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid parameter {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Pipeline configuration, passed by reference into every stage.
///
/// All defaults are explicit constants above rather than inherited library
/// behavior. Construct via [`Default`], struct update, or [`from_json`]
/// for callers that ship options as a JSON map.
///
/// [`from_json`]: ForecastParams::from_json
#[derive(Debug, Clone)]
pub struct ForecastParams {
    /// Record field holding the timestamp. Caller convention; feeds use
    /// names like `timestamp` or `recorded_at`.
    pub timestamp_field: String,
    /// Record field holding the availability count.
    pub value_field: String,
    /// Duration subtracted from the latest timestamp to place the
    /// train/test cutoff.
    pub lookback: Duration,
    /// Spacing of generated future forecast timestamps.
    pub sampling_interval: Duration,
    /// Fit a daily periodic component.
    pub daily_seasonality: bool,
    /// Fit a weekly periodic component.
    pub weekly_seasonality: bool,
    /// Confidence level of the prediction interval bounds, in (0, 1).
    pub confidence_level: f64,
    /// Duplicate-timestamp handling at ingestion.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ForecastParams {
    fn default() -> Self {
        ForecastParams {
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            value_field: DEFAULT_VALUE_FIELD.to_string(),
            lookback: Duration::hours(DEFAULT_LOOKBACK_HOURS),
            sampling_interval: Duration::minutes(DEFAULT_SAMPLING_MINUTES),
            daily_seasonality: true,
            weekly_seasonality: true,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl ForecastParams {
    /// Build params from a caller-supplied JSON option map.
    ///
    /// Missing keys keep their defaults; unknown keys are ignored. `null`
    /// stands for "no options". The result is validated before it is
    /// returned, so a successfully built value is always usable.
    pub fn from_json(options: &Value) -> Result<Self, ConfigError> {
        let mut params = ForecastParams::default();

        match options {
            Value::Null => {}
            Value::Object(map) => {
                if let Some(v) = map.get("timestamp_field") {
                    params.timestamp_field = string_option("timestamp_field", v)?;
                }
                if let Some(v) = map.get("value_field") {
                    params.value_field = string_option("value_field", v)?;
                }
                if let Some(v) = map.get("lookback_hours") {
                    params.lookback = Duration::hours(integer_option("lookback_hours", v)?);
                }
                if let Some(v) = map.get("sampling_interval_minutes") {
                    params.sampling_interval =
                        Duration::minutes(integer_option("sampling_interval_minutes", v)?);
                }
                if let Some(v) = map.get("daily_seasonality") {
                    params.daily_seasonality = bool_option("daily_seasonality", v)?;
                }
                if let Some(v) = map.get("weekly_seasonality") {
                    params.weekly_seasonality = bool_option("weekly_seasonality", v)?;
                }
                if let Some(v) = map.get("confidence_level") {
                    params.confidence_level = float_option("confidence_level", v)?;
                }
                if let Some(v) = map.get("duplicate_policy") {
                    params.duplicate_policy = policy_option("duplicate_policy", v)?;
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    name: "options",
                    reason: format!("must be a JSON object or null, got {other}"),
                });
            }
        }

        params.validate()?;
        Ok(params)
    }

    /// Check invariants on the configured values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_field.is_empty() {
            return Err(invalid("timestamp_field", "must not be empty"));
        }
        if self.value_field.is_empty() {
            return Err(invalid("value_field", "must not be empty"));
        }
        if self.lookback <= Duration::zero() {
            return Err(invalid("lookback", "must be a positive duration"));
        }
        if self.sampling_interval <= Duration::zero() {
            return Err(invalid("sampling_interval", "must be a positive duration"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(invalid(
                "confidence_level",
                "must be between 0.0 and 1.0 (exclusive)",
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { name, reason: reason.to_string() }
}

fn string_option(name: &'static str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            reason: format!("must be a string, got {value}"),
        })
}

fn integer_option(name: &'static str, value: &Value) -> Result<i64, ConfigError> {
    value.as_i64().ok_or_else(|| ConfigError::Invalid {
        name,
        reason: format!("must be an integer, got {value}"),
    })
}

fn float_option(name: &'static str, value: &Value) -> Result<f64, ConfigError> {
    value.as_f64().ok_or_else(|| ConfigError::Invalid {
        name,
        reason: format!("must be a number, got {value}"),
    })
}

fn bool_option(name: &'static str, value: &Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| ConfigError::Invalid {
        name,
        reason: format!("must be a boolean, got {value}"),
    })
}

fn policy_option(name: &'static str, value: &Value) -> Result<DuplicatePolicy, ConfigError> {
    let text = string_option(name, value)?;
    match text.as_str() {
        "keep_all" => Ok(DuplicatePolicy::KeepAll),
        "last_wins" => Ok(DuplicatePolicy::LastWins),
        "reject" => Ok(DuplicatePolicy::Reject),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unknown policy '{other}'; valid policies: keep_all, last_wins, reject"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let params = ForecastParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.lookback, Duration::hours(24));
        assert_eq!(params.sampling_interval, Duration::minutes(15));
        assert!(params.daily_seasonality);
        assert!(params.weekly_seasonality);
        assert_eq!(params.duplicate_policy, DuplicatePolicy::KeepAll);
    }

    #[test]
    fn test_from_json_null_keeps_defaults() {
        let params = ForecastParams::from_json(&Value::Null).unwrap();
        assert_eq!(params.timestamp_field, "timestamp");
        assert_eq!(params.value_field, "available");
    }

    #[test]
    fn test_from_json_overrides() {
        let params = ForecastParams::from_json(&json!({
            "timestamp_field": "recorded_at",
            "lookback_hours": 48,
            "sampling_interval_minutes": 30,
            "weekly_seasonality": false,
            "confidence_level": 0.8,
            "duplicate_policy": "last_wins",
        }))
        .unwrap();

        assert_eq!(params.timestamp_field, "recorded_at");
        assert_eq!(params.lookback, Duration::hours(48));
        assert_eq!(params.sampling_interval, Duration::minutes(30));
        assert!(params.daily_seasonality);
        assert!(!params.weekly_seasonality);
        assert_eq!(params.confidence_level, 0.8);
        assert_eq!(params.duplicate_policy, DuplicatePolicy::LastWins);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = ForecastParams::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("JSON object"), "error: {err}");
    }

    #[test]
    fn test_from_json_rejects_bad_policy() {
        let err =
            ForecastParams::from_json(&json!({"duplicate_policy": "average"})).unwrap_err();
        assert!(err.to_string().contains("unknown policy"), "error: {err}");
    }

    #[test]
    fn test_validate_rejects_zero_lookback() {
        let params = ForecastParams { lookback: Duration::zero(), ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_confidence_level_bounds() {
        for level in [0.0, 1.0, -0.5, 1.5] {
            let params = ForecastParams { confidence_level: level, ..Default::default() };
            assert!(
                params.validate().is_err(),
                "confidence_level {level} should be rejected"
            );
        }
    }
}
