//! Stored gig documents → [`Gig`] values.
//!
//! Gigs are entered into the database by hand, so a document may lack any
//! field or hold the wrong type in it. Normalization never fails: each field
//! goes through one coercion with one default.
//!
//! | field          | coercion                      | default        |
//! |----------------|-------------------------------|----------------|
//! | `title`        | [`coerce_text`]               | `""`           |
//! | `venue`        | [`coerce_text`]               | `""`           |
//! | `city`         | [`coerce_text`]               | `""`           |
//! | `date`         | [`coerce_timestamp`]          | now            |
//! | `ticket_url`   | [`coerce_optional_text`]      | `None`         |
//! | `is_confirmed` | [`coerce_truthy`]             | `true`         |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::schema::Gig;
use crate::store::{Document, Value};

/// Integer timestamps above this magnitude are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 20_000_000_000;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Converts one stored gig document, using the current time for dates that
/// are missing or unreadable.
pub fn normalize(doc: &Document) -> Gig {
    normalize_at(doc, Utc::now())
}

/// [`normalize`] with an explicit "now".
pub fn normalize_at(doc: &Document, now: DateTime<Utc>) -> Gig {
    Gig {
        title:        coerce_text(doc.get("title")),
        venue:        coerce_text(doc.get("venue")),
        city:         coerce_text(doc.get("city")),
        date:         coerce_timestamp(doc.get("date"), now),
        ticket_url:   coerce_optional_text(doc.get("ticket_url")),
        is_confirmed: coerce_truthy(doc.get("is_confirmed"), true),
    }
}

/// Text as stored; numbers rendered as text; anything else is `""`.
pub fn coerce_text(value: Option<&Value>) -> String {
    coerce_optional_text(value).unwrap_or_default()
}

/// Like [`coerce_text`], but absent, null and non-scalar values are `None`.
pub fn coerce_optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Text(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Truthiness of the stored value, or `absent` when there is none.
///
/// A stored `null` is present and falsy, so it yields `false`.
pub fn coerce_truthy(value: Option<&Value>, absent: bool) -> bool {
    value.map_or(absent, Value::is_truthy)
}

/// Native timestamps as-is; ISO-8601 text parsed; numbers read as Unix time.
/// Anything else, including text that does not parse, becomes `now`.
pub fn coerce_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::Timestamp(t)) => Some(*t),
        Some(Value::Text(s)) => parse_iso8601(s),
        Some(Value::Int(i)) => from_unix(*i),
        Some(Value::Float(f)) if f.is_finite() => from_unix_f64(*f),
        _ => None,
    };
    parsed.unwrap_or(now)
}

/// ISO-8601 with or without an offset; naive values are taken as UTC.
/// A bare date means midnight.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Some(t.with_timezone(&Utc));
    }
    if let Some(t) = NAIVE_FORMATS.iter().find_map(|f| NaiveDateTime::parse_from_str(s, f).ok()) {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

fn from_unix(i: i64) -> Option<DateTime<Utc>> {
    if i.unsigned_abs() > MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(i)
    } else {
        DateTime::from_timestamp(i, 0)
    }
}

fn from_unix_f64(f: f64) -> Option<DateTime<Utc>> {
    let secs = if f.abs() > MILLIS_THRESHOLD as f64 { f / 1000.0 } else { f };
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}
