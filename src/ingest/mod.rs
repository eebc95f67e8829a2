//! Ingestion & normalization: raw JSON records into a time-ordered series.
//!
//! Records arrive in whatever field convention the caller uses (configured
//! via [`ForecastParams`]); timestamps may carry an offset, which is
//! stripped to a naive wall clock. Callers are assumed to supply a single
//! consistent timezone upstream; mixed offsets are not reconciled here.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use tracing::warn;

use crate::common::params::{DuplicatePolicy, ForecastParams};
use crate::common::types::{observed_interval, Reading, Series};
use crate::error::PipelineError;

/// Accepted offset-free timestamp layouts, tried after RFC 3339.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse raw records into a sorted, normalized [`Series`].
///
/// Fails with [`PipelineError::InsufficientData`] on empty input and
/// [`PipelineError::MalformedRecord`] on the first record whose timestamp
/// or availability cannot be coerced; no partial series is ever produced.
/// The sort is stable, so readings sharing a timestamp keep input order
/// before the configured [`DuplicatePolicy`] is applied.
pub fn read_readings(
    records: &[Value],
    params: &ForecastParams,
) -> Result<Series, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::InsufficientData);
    }

    // Original input positions ride along so duplicate rejection can name
    // the offending record after sorting.
    let mut readings: Vec<(usize, Reading)> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let fields = record.as_object().ok_or_else(|| malformed(
            index,
            format!("record must be a JSON object, got {record}"),
        ))?;

        let raw_timestamp = fields.get(&params.timestamp_field).ok_or_else(|| {
            malformed(index, format!("missing field '{}'", params.timestamp_field))
        })?;
        let timestamp =
            parse_timestamp(raw_timestamp).map_err(|reason| malformed(index, reason))?;

        let raw_value = fields.get(&params.value_field).ok_or_else(|| {
            malformed(index, format!("missing field '{}'", params.value_field))
        })?;
        let available =
            coerce_available(raw_value).map_err(|reason| malformed(index, reason))?;

        readings.push((index, Reading { timestamp, available }));
    }

    readings.sort_by_key(|(_, r)| r.timestamp);
    let readings = apply_duplicate_policy(readings, params.duplicate_policy)?;

    let timestamps: Vec<NaiveDateTime> = readings.iter().map(|r| r.timestamp).collect();
    if let Some(interval) = observed_interval(&timestamps) {
        if interval != params.sampling_interval {
            // A cadence drift is the usual precursor of a downstream
            // TimestampAlignment failure; say so while the context is known.
            warn!(
                observed_minutes = interval.num_minutes(),
                configured_minutes = params.sampling_interval.num_minutes(),
                "dominant reading cadence differs from the configured sampling interval"
            );
        }
    }

    Ok(Series { readings })
}

/// Parse one timestamp value.
///
/// RFC 3339 strings keep their wall clock and drop the offset; offset-free
/// strings are taken as-is. Timestamps must be strings; numeric epochs are
/// rejected rather than guessed at.
fn parse_timestamp(raw: &Value) -> Result<NaiveDateTime, String> {
    let text = raw
        .as_str()
        .ok_or_else(|| format!("timestamp must be a string, got {raw}"))?;

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(instant);
        }
    }
    Err(format!("unparseable timestamp '{text}'"))
}

/// Coerce one availability value to a non-negative integer.
///
/// Integers pass through, floats are truncated toward zero, and integer
/// strings are parsed. Anything else is malformed.
fn coerce_available(raw: &Value) -> Result<i64, String> {
    let value = if let Some(n) = raw.as_i64() {
        n
    } else if let Some(f) = raw.as_f64() {
        if !f.is_finite() {
            return Err(format!("availability value {f} is not finite"));
        }
        f.trunc() as i64
    } else if let Some(s) = raw.as_str() {
        s.trim()
            .parse::<i64>()
            .map_err(|_| format!("availability value '{s}' is not an integer"))?
    } else {
        return Err(format!("availability must be a number, got {raw}"));
    };

    if value < 0 {
        return Err(format!("availability must be non-negative, got {value}"));
    }
    Ok(value)
}

fn apply_duplicate_policy(
    sorted: Vec<(usize, Reading)>,
    policy: DuplicatePolicy,
) -> Result<Vec<Reading>, PipelineError> {
    match policy {
        DuplicatePolicy::KeepAll => Ok(sorted.into_iter().map(|(_, r)| r).collect()),
        DuplicatePolicy::LastWins => {
            let mut deduped: Vec<Reading> = Vec::with_capacity(sorted.len());
            for (_, reading) in sorted {
                match deduped.last_mut() {
                    // Stable sort keeps input order within a timestamp, so
                    // the final occurrence overwrites the earlier ones.
                    Some(last) if last.timestamp == reading.timestamp => *last = reading,
                    _ => deduped.push(reading),
                }
            }
            Ok(deduped)
        }
        DuplicatePolicy::Reject => {
            for pair in sorted.windows(2) {
                if pair[0].1.timestamp == pair[1].1.timestamp {
                    return Err(malformed(
                        pair[1].0,
                        format!("duplicate timestamp {}", pair[1].1.timestamp),
                    ));
                }
            }
            Ok(sorted.into_iter().map(|(_, r)| r).collect())
        }
    }
}

fn malformed(index: usize, reason: String) -> PipelineError {
    PipelineError::MalformedRecord { index, reason }
}
