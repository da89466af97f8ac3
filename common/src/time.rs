//! Timestamp normalization.
//!
//! Stored documents carry instants in several shapes: values written by this
//! service (RFC 3339 strings), legacy exports (`{_seconds, _nanoseconds}`),
//! wire-level pairs (`{seconds, nanoseconds}`) and plain epoch milliseconds.
//! Everything funnels into a single [`DateTime<Utc>`].
//!
//! Two policies are offered:
//!
//! - [`normalize`] / [`normalize_or`]: lenient. Unknown or missing input falls
//!   back to "now" (or the supplied fallback). Meant for read and display paths.
//! - [`normalize_strict`]: returns a [`TimestampError`] for anything it cannot
//!   interpret, so write paths can refuse corrupt data instead of masking it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a timestamp could not be interpreted by [`normalize_strict`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("unparseable timestamp string: {0:?}")]
    Unparseable(String),

    #[error("timestamp out of range: {0} ms")]
    OutOfRange(i64),

    #[error("unsupported timestamp shape: {0}")]
    Unsupported(String),
}

/// Anything that can be read as an instant.
///
/// `Ok(None)` means "absent"; the lenient helpers map it to the fallback.
pub trait TimestampSource {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError>;
}

impl TimestampSource for DateTime<Utc> {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        Ok(Some(*self))
    }
}

impl TimestampSource for i64 {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        from_millis(*self).map(Some)
    }
}

impl TimestampSource for str {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        parse_text(self).map(Some)
    }
}

impl TimestampSource for Value {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        match self {
            Value::Null => Ok(None),
            Value::String(text) => parse_text(text).map(Some),
            Value::Number(number) => {
                let millis = match number.as_i64() {
                    Some(millis) => millis,
                    None => number
                        .as_f64()
                        .filter(|f| f.is_finite())
                        .map(|f| f.floor() as i64)
                        .ok_or_else(|| TimestampError::Unsupported(number.to_string()))?,
                };
                from_millis(millis).map(Some)
            }
            Value::Object(map) => from_parts(map).map(Some),
            other => Err(TimestampError::Unsupported(other.to_string())),
        }
    }
}

impl<T: TimestampSource> TimestampSource for Option<T> {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        match self {
            Some(inner) => inner.to_instant(),
            None => Ok(None),
        }
    }
}

impl<T: TimestampSource + ?Sized> TimestampSource for &T {
    fn to_instant(&self) -> Result<Option<DateTime<Utc>>, TimestampError> {
        (**self).to_instant()
    }
}

/// Current instant; also the serde default for missing timestamp fields.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Lenient normalization with "now" as the fallback.
pub fn normalize<T: TimestampSource + ?Sized>(input: &T) -> DateTime<Utc> {
    normalize_or(input, now())
}

/// Lenient normalization with an explicit fallback instant.
pub fn normalize_or<T: TimestampSource + ?Sized>(
    input: &T,
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    match input.to_instant() {
        Ok(Some(instant)) => instant,
        Ok(None) | Err(_) => fallback,
    }
}

/// Strict normalization: absent is `Ok(None)`, garbage is an error.
pub fn normalize_strict<T: TimestampSource + ?Sized>(
    input: &T,
) -> Result<Option<DateTime<Utc>>, TimestampError> {
    input.to_instant()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, TimestampError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(TimestampError::OutOfRange(millis))
}

fn from_parts(map: &Map<String, Value>) -> Result<DateTime<Utc>, TimestampError> {
    let field = |name: &str, legacy: &str| map.get(name).or_else(|| map.get(legacy));
    let as_int = |value: &Value| value.as_i64().or_else(|| value.as_f64().map(|f| f.floor() as i64));

    let seconds = field("seconds", "_seconds")
        .and_then(as_int)
        .ok_or_else(|| TimestampError::Unsupported(Value::Object(map.clone()).to_string()))?;
    let nanos = field("nanoseconds", "_nanoseconds").and_then(as_int).unwrap_or(0);

    let millis = seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(nanos.div_euclid(1_000_000)))
        .ok_or(TimestampError::OutOfRange(seconds))?;
    from_millis(millis)
}

fn parse_text(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    Err(TimestampError::Unparseable(text.to_string()))
}

/// `#[serde(deserialize_with = "...")]` helper for required instants.
pub mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(super::normalize(&raw))
    }
}

/// Same as [`lenient`] but keeps absence as `None`.
pub mod lenient_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            None | Some(Value::Null) => None,
            Some(value) => Some(super::normalize(&value)),
        })
    }
}
