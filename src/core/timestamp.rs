//! Timestamp layouts for the `time` field
//!
//! ISO layouts end in `Z` when rendered in UTC and carry a `+hh:mm` offset
//! when rendered in local time. Unix layouts are plain integers and are never
//! quoted by the JSON painter.

use super::buffer::Buffer;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Layout of the record timestamp
///
/// # Examples
///
/// ```
/// use rust_structured_logger::core::TimeLayout;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(TimeLayout::Iso8601Millis.format(&t, true), "2024-01-01T00:00:00.000Z");
/// assert_eq!(TimeLayout::Unix.format(&t, true), "1704067200");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeLayout {
    /// `2024-01-01T00:00:00.000000000Z`
    #[default]
    Iso8601Nanos,

    /// `2024-01-01T00:00:00.000000Z`
    Iso8601Micros,

    /// `2024-01-01T00:00:00.000Z`
    Iso8601Millis,

    /// `2024-01-01T00:00:00Z`, or with a `+hh:mm` offset in local time
    Rfc3339,

    /// Seconds since the epoch
    Unix,

    UnixMillis,

    UnixMicros,

    /// Any strftime-compatible pattern
    ///
    /// A pattern chrono cannot render falls back to [`TimeLayout::Iso8601Nanos`].
    Custom(String),
}

impl TimeLayout {
    /// Append the formatted timestamp to `buf`
    pub fn write(&self, time: &DateTime<Utc>, utc: bool, buf: &mut Buffer) {
        match self {
            TimeLayout::Unix => buf.write_int(time.timestamp()),
            TimeLayout::UnixMillis => buf.write_int(time.timestamp_millis()),
            TimeLayout::UnixMicros => buf.write_int(time.timestamp_micros()),
            _ => {
                let mark = buf.len();
                let pattern = self.pattern(utc);
                let written = if utc {
                    write_pattern(buf, time, pattern)
                } else {
                    write_pattern(buf, &time.with_timezone(&Local), pattern)
                };
                if written.is_err() {
                    buf.truncate(mark);
                    buf.write_time(time);
                }
            }
        }
    }

    #[must_use]
    pub fn format(&self, time: &DateTime<Utc>, utc: bool) -> String {
        let mut buf = Buffer::with_capacity(40);
        self.write(time, utc, &mut buf);
        String::from_utf8_lossy(buf.as_bytes()).into_owned()
    }

    /// Check if this is a Unix-based numeric layout
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimeLayout::Unix | TimeLayout::UnixMillis | TimeLayout::UnixMicros
        )
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            TimeLayout::Iso8601Nanos => "ISO 8601 with nanoseconds",
            TimeLayout::Iso8601Micros => "ISO 8601 with microseconds",
            TimeLayout::Iso8601Millis => "ISO 8601 with milliseconds",
            TimeLayout::Rfc3339 => "RFC 3339 with whole seconds",
            TimeLayout::Unix => "Unix timestamp in seconds",
            TimeLayout::UnixMillis => "Unix timestamp in milliseconds",
            TimeLayout::UnixMicros => "Unix timestamp in microseconds",
            TimeLayout::Custom(_) => "Custom strftime format",
        }
    }

    fn pattern(&self, utc: bool) -> &str {
        match (self, utc) {
            (TimeLayout::Iso8601Nanos, true) => "%Y-%m-%dT%H:%M:%S%.9fZ",
            (TimeLayout::Iso8601Nanos, false) => "%Y-%m-%dT%H:%M:%S%.9f%:z",
            (TimeLayout::Iso8601Micros, true) => "%Y-%m-%dT%H:%M:%S%.6fZ",
            (TimeLayout::Iso8601Micros, false) => "%Y-%m-%dT%H:%M:%S%.6f%:z",
            (TimeLayout::Iso8601Millis, true) => "%Y-%m-%dT%H:%M:%S%.3fZ",
            (TimeLayout::Iso8601Millis, false) => "%Y-%m-%dT%H:%M:%S%.3f%:z",
            (TimeLayout::Rfc3339, true) => "%Y-%m-%dT%H:%M:%SZ",
            (TimeLayout::Rfc3339, false) => "%Y-%m-%dT%H:%M:%S%:z",
            (TimeLayout::Custom(pattern), _) => pattern.as_str(),
            // numeric layouts never reach the strftime path
            (_, _) => "%s",
        }
    }
}

fn write_pattern<Tz>(buf: &mut Buffer, time: &DateTime<Tz>, pattern: &str) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    write!(buf, "{}", time.format(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456789 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::nanoseconds(123_456_789)
    }

    #[test]
    fn test_iso8601_layouts() {
        let t = fixed_datetime();
        assert_eq!(TimeLayout::Iso8601Nanos.format(&t, true), "2025-01-08T10:30:45.123456789Z");
        assert_eq!(TimeLayout::Iso8601Micros.format(&t, true), "2025-01-08T10:30:45.123456Z");
        assert_eq!(TimeLayout::Iso8601Millis.format(&t, true), "2025-01-08T10:30:45.123Z");
        assert_eq!(TimeLayout::Rfc3339.format(&t, true), "2025-01-08T10:30:45Z");
    }

    #[test]
    fn test_local_layout_has_offset() {
        let result = TimeLayout::Iso8601Nanos.format(&fixed_datetime(), false);
        assert!(!result.ends_with('Z'));
        // "+hh:mm" or "-hh:mm"
        let offset = &result[result.len() - 6..];
        assert!(offset.starts_with('+') || offset.starts_with('-'));
        assert_eq!(&offset[3..4], ":");
    }

    #[test]
    fn test_unix_layouts() {
        let t = fixed_datetime();
        assert_eq!(TimeLayout::Unix.format(&t, true), "1736332245");
        assert_eq!(TimeLayout::UnixMillis.format(&t, true), "1736332245123");
        assert_eq!(TimeLayout::UnixMicros.format(&t, false), "1736332245123456");
    }

    #[test]
    fn test_custom_layout() {
        let layout = TimeLayout::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(layout.format(&fixed_datetime(), true), "2025/01/08 10:30");
    }

    #[test]
    fn test_invalid_custom_layout_falls_back() {
        let layout = TimeLayout::Custom("%Q".to_string());
        assert_eq!(layout.format(&fixed_datetime(), true), "2025-01-08T10:30:45.123456789Z");
    }

    #[test]
    fn test_default_is_nanos() {
        assert_eq!(TimeLayout::default(), TimeLayout::Iso8601Nanos);
    }

    #[test]
    fn test_is_numeric() {
        assert!(!TimeLayout::Iso8601Nanos.is_numeric());
        assert!(!TimeLayout::Rfc3339.is_numeric());
        assert!(TimeLayout::Unix.is_numeric());
        assert!(TimeLayout::UnixMicros.is_numeric());
        assert!(!TimeLayout::Custom("%s".to_string()).is_numeric());
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&TimeLayout::UnixMillis).expect("serialize");
        assert_eq!(json, "\"UnixMillis\"");

        let layout: TimeLayout =
            serde_json::from_str(r#"{"Custom":"%Y-%m-%d"}"#).expect("deserialize Custom");
        assert_eq!(layout, TimeLayout::Custom("%Y-%m-%d".to_string()));
    }
}
