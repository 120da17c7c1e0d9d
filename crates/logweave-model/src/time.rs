use chrono::{DateTime, FixedOffset, Local, Utc};
use serde_json::Value;
use tracing::warn;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Time zone entry timestamps are formatted in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayTimeZone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl DisplayTimeZone {
    /// Parse "utc", "browser"/"local" or a "+HH:MM" offset. Anything else
    /// falls back to UTC.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "utc" => Self::Utc,
            "browser" | "local" => Self::Local,
            other => match parse_offset(other) {
                Some(offset) => Self::Fixed(offset),
                None => {
                    warn!(time_zone = other, "unknown display time zone, using UTC");
                    Self::Utc
                }
            },
        }
    }

    pub fn format(&self, ts: &DateTime<Utc>) -> String {
        match self {
            Self::Utc => ts.format(DISPLAY_FORMAT).to_string(),
            Self::Local => ts.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
            Self::Fixed(offset) => ts.with_timezone(offset).format(DISPLAY_FORMAT).to_string(),
        }
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Epoch milliseconds from a time field value: a number, a numeric string or
/// an RFC 3339 timestamp.
pub fn parse_time_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            })
        }
        _ => None,
    }
}

/// Nanosecond timestamp from the high-precision field, else derived from
/// milliseconds.
pub fn parse_time_ns(value: Option<&Value>, fallback_ms: i64) -> i64 {
    let parsed = match value {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    parsed.unwrap_or_else(|| fallback_ms.saturating_mul(1_000_000))
}
