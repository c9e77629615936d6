//! Readings, history and snapshot decoding
//!
//! A snapshot is the full value stored at a feed path: either `null` (no
//! readings yet) or an object mapping opaque record keys to records shaped
//! like `{ "speed": 12.5, "timestamp": 1700000000000 }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;

use crate::error::FeedError;

/// One wind-speed sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Wind speed in m/s
    pub speed: f64,
    /// Epoch or sequence value; not guaranteed unique
    pub timestamp: i64,
}

impl Reading {
    /// Create a new reading
    pub fn new(speed: f64, timestamp: i64) -> Self {
        Self { speed, timestamp }
    }
}

/// All known readings, newest first
///
/// The only way to build a `History` is from an unordered collection of
/// readings, which is sorted on construction, so a `History` is always
/// ordered by timestamp descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History(Vec<Reading>);

impl History {
    /// Build a history from readings in any order
    ///
    /// Uses a stable sort, so readings with equal timestamps keep their
    /// input order.
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut readings: Vec<Reading> = readings.into_iter().collect();
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self(readings)
    }

    /// The most recent reading
    pub fn newest(&self) -> Option<&Reading> {
        self.0.first()
    }

    /// Speeds in history order
    pub fn speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|r| r.speed)
    }

    /// Borrow the readings as a slice
    pub fn as_slice(&self) -> &[Reading] {
        &self.0
    }

    /// Consume the history, returning the sorted readings
    pub fn into_vec(self) -> Vec<Reading> {
        self.0
    }
}

impl Deref for History {
    type Target = [Reading];

    fn deref(&self) -> &[Reading] {
        &self.0
    }
}

/// How to treat records that don't decode into a [`Reading`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// Drop the record, log it, and keep the rest of the snapshot
    #[default]
    Skip,
    /// Fail the whole snapshot
    Reject,
}

/// A record dropped while decoding under [`RecordPolicy::Skip`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Key of the record in the snapshot
    pub key: String,
    /// Why it could not be decoded
    pub reason: String,
}

/// Result of decoding one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSnapshot {
    /// Readings in key order (unsorted by time)
    pub readings: Vec<Reading>,
    /// Records that were dropped
    pub skipped: Vec<SkippedRecord>,
}

/// Decode a snapshot value into readings
///
/// `null` decodes to an empty snapshot. Any other non-object value is an
/// [`FeedError::InvalidSnapshot`]. Record keys are visited in sorted order,
/// so the output is deterministic for a given value.
pub fn decode_snapshot(value: &Value, policy: RecordPolicy) -> Result<DecodedSnapshot, FeedError> {
    let records = match value {
        Value::Null => return Ok(DecodedSnapshot::default()),
        Value::Object(map) => map,
        other => {
            return Err(FeedError::InvalidSnapshot(format!(
                "expected an object of records, got {}",
                value_kind(other)
            )))
        }
    };

    let mut decoded = DecodedSnapshot {
        readings: Vec::with_capacity(records.len()),
        skipped: Vec::new(),
    };

    let mut keys: Vec<&String> = records.keys().collect();
    keys.sort();

    for key in keys {
        match decode_record(&records[key.as_str()]) {
            Ok(reading) => decoded.readings.push(reading),
            Err(reason) => match policy {
                RecordPolicy::Reject => {
                    return Err(FeedError::MalformedReading {
                        key: key.clone(),
                        reason,
                    })
                }
                RecordPolicy::Skip => {
                    tracing::warn!("Skipping malformed reading '{key}': {reason}");
                    decoded.skipped.push(SkippedRecord {
                        key: key.clone(),
                        reason,
                    });
                }
            },
        }
    }

    Ok(decoded)
}

/// Decode a single record
fn decode_record(record: &Value) -> Result<Reading, String> {
    let fields = record
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", value_kind(record)))?;

    let speed = fields
        .get("speed")
        .ok_or("missing field 'speed'")?
        .as_f64()
        .ok_or("field 'speed' is not a number")?;
    if !speed.is_finite() || speed < 0.0 {
        return Err(format!("speed {speed} is outside the valid range"));
    }

    let raw_timestamp = fields.get("timestamp").ok_or("missing field 'timestamp'")?;
    let timestamp = match raw_timestamp.as_i64() {
        Some(t) => t,
        None => {
            let t = raw_timestamp
                .as_f64()
                .ok_or("field 'timestamp' is not a number")?;
            // Whole-valued floats are accepted, e.g. `1.7e12`
            if t.fract() != 0.0 || t < i64::MIN as f64 || t >= i64::MAX as f64 {
                return Err(format!("timestamp {t} is not a valid integer"));
            }
            t as i64
        }
    };

    Ok(Reading::new(speed, timestamp))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_sorted_newest_first() {
        let history = History::from_readings(vec![
            Reading::new(1.0, 10),
            Reading::new(2.0, 30),
            Reading::new(3.0, 20),
        ]);
        let timestamps: Vec<i64> = history.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![30, 20, 10]);
        assert_eq!(history.newest().unwrap().speed, 2.0);
    }

    #[test]
    fn test_history_ties_keep_input_order() {
        let history = History::from_readings(vec![
            Reading::new(1.0, 5),
            Reading::new(2.0, 5),
            Reading::new(3.0, 9),
        ]);
        let speeds: Vec<f64> = history.speeds().collect();
        assert_eq!(speeds, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_decode_null_is_empty() {
        let decoded = decode_snapshot(&Value::Null, RecordPolicy::Skip).unwrap();
        assert!(decoded.readings.is_empty());
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_decode_records() {
        let snapshot = json!({
            "-b": { "speed": 12.5, "timestamp": 200 },
            "-a": { "speed": 40, "timestamp": 100, "direction": "S" },
        });
        let decoded = decode_snapshot(&snapshot, RecordPolicy::Reject).unwrap();
        assert_eq!(
            decoded.readings,
            vec![Reading::new(40.0, 100), Reading::new(12.5, 200)]
        );
    }

    #[test]
    fn test_decode_whole_float_timestamp() {
        let snapshot = json!({ "k": { "speed": 1.0, "timestamp": 1700000000000.0 } });
        let decoded = decode_snapshot(&snapshot, RecordPolicy::Reject).unwrap();
        assert_eq!(decoded.readings[0].timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_decode_skip_policy_drops_bad_records() {
        let snapshot = json!({
            "a": { "speed": 5.0, "timestamp": 1 },
            "b": { "timestamp": 2 },
            "c": { "speed": "fast", "timestamp": 3 },
            "d": { "speed": -1.0, "timestamp": 4 },
            "e": { "speed": 5.0, "timestamp": 4.5 },
            "f": 17,
        });
        let decoded = decode_snapshot(&snapshot, RecordPolicy::Skip).unwrap();
        assert_eq!(decoded.readings, vec![Reading::new(5.0, 1)]);
        let keys: Vec<&str> = decoded.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_decode_reject_policy_fails_snapshot() {
        let snapshot = json!({
            "a": { "speed": 5.0, "timestamp": 1 },
            "b": { "speed": 5.0 },
        });
        let err = decode_snapshot(&snapshot, RecordPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            FeedError::MalformedReading {
                key: "b".to_string(),
                reason: "missing field 'timestamp'".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_object_snapshot() {
        let err = decode_snapshot(&json!([1, 2, 3]), RecordPolicy::Skip).unwrap_err();
        assert!(matches!(err, FeedError::InvalidSnapshot(_)));
    }
}
