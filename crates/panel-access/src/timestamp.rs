//! Timestamp normalization.
//!
//! The backing store hands timestamps back in several shapes depending on the
//! writer: native database timestamps (seconds + nanoseconds), epoch
//! milliseconds, ISO-like strings, or already-typed date values. All of them
//! collapse to `Option<DateTime<Utc>>`; anything unparseable becomes `None`.
//! Only years 0..=9999 are kept so a normalized value always re-parses from
//! its RFC 3339 form.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// A timestamp in any of the accepted input shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampValue {
    /// Database-native timestamp.
    Native { seconds: i64, nanos: u32 },
    DateTime(DateTime<Utc>),
    EpochMillis(f64),
    Text(String),
}

impl TimestampValue {
    /// Classify a raw JSON value. Returns `None` for shapes that can never be
    /// a timestamp (null, booleans, arrays, unrelated objects).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(TimestampValue::EpochMillis),
            Value::String(text) => Some(TimestampValue::Text(text.clone())),
            Value::Object(map) => {
                // Admin SDKs serialize with a leading underscore, REST without.
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64)?;
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let nanos = u32::try_from(nanos).ok()?;
                Some(TimestampValue::Native { seconds, nanos })
            }
            _ => None,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let value = match self {
            TimestampValue::Native { seconds, nanos } => {
                if *nanos >= 1_000_000_000 {
                    return None;
                }
                DateTime::from_timestamp(*seconds, *nanos)
            }
            TimestampValue::DateTime(value) => Some(*value),
            TimestampValue::EpochMillis(millis) => {
                if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
                    return None;
                }
                DateTime::from_timestamp_millis(millis.trunc() as i64)
            }
            TimestampValue::Text(text) => parse_text(text),
        }?;
        SUPPORTED_YEARS.contains(&value.year()).then_some(value)
    }
}

// Largest magnitude a calendar date can carry (±100,000,000 days).
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

/// Normalize an optional raw field into a calendar timestamp.
pub fn normalize_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(TimestampValue::from_json)
        .and_then(|value| value.to_datetime())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Option<DateTime<Utc>> {
        normalize_timestamp(Some(&value))
    }

    #[test]
    fn accepts_every_supported_shape() {
        let expected = DateTime::parse_from_rfc3339("2025-11-23T10:58:00Z")
            .expect("fixture")
            .with_timezone(&Utc);
        assert_eq!(parse(json!("2025-11-23T10:58:00.000Z")), Some(expected));
        assert_eq!(parse(json!("2025-11-23T10:58:00")), Some(expected));
        assert_eq!(parse(json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(
            parse(json!({ "seconds": expected.timestamp(), "nanoseconds": 0 })),
            Some(expected)
        );
        assert_eq!(
            parse(json!({ "_seconds": expected.timestamp(), "_nanoseconds": 0 })),
            Some(expected)
        );
        assert_eq!(
            TimestampValue::DateTime(expected).to_datetime(),
            Some(expected)
        );
    }

    #[test]
    fn date_only_strings_are_midnight_utc() {
        let value = parse(json!("2025-06-02")).expect("date");
        assert_eq!(value.to_rfc3339(), "2025-06-02T00:00:00+00:00");
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(parse(json!("not-a-date")), None);
        assert_eq!(parse(json!("   ")), None);
        assert_eq!(parse(json!(true)), None);
        assert_eq!(parse(json!(null)), None);
        assert_eq!(parse(json!(["2025-01-01"])), None);
        assert_eq!(parse(json!({ "label": "x" })), None);
        assert_eq!(parse(json!(1e300)), None);
        assert_eq!(
            parse(json!({ "seconds": 10, "nanoseconds": 2_000_000_000u64 })),
            None
        );
        assert_eq!(normalize_timestamp(None), None);
    }

    #[test]
    fn years_past_9999_are_dropped() {
        assert_eq!(parse(json!(300_000_000_000_000_i64)), None);
        assert_eq!(parse(json!({ "seconds": 300_000_000_000_i64 })), None);
        assert_eq!(parse(json!(-62_198_755_200_000_i64)), None);
        let last = parse(json!("9999-12-31T23:59:59Z")).expect("last supported instant");
        assert_eq!(parse(json!(last.timestamp_millis())), Some(last));
    }
}
