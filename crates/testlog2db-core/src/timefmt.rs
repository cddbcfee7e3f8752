//! The two fixed textual timestamp encodings of the pipeline, plus the
//! compact stamp used as a substitute software version.
//!
//! Report documents carry fractional-second timestamps; everything written
//! to storage is seconds-precision.

use chrono::{Duration, NaiveDateTime};

/// Timestamp encoding used by pytest JUnit-XML reports (fractional seconds;
/// the fraction may be absent).
pub const REPORT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Timestamp encoding for every value written to storage.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact stamp substituted for an empty software version.
pub const COMPACT_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Parse a report-document timestamp.
pub fn parse_report_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, REPORT_FORMAT)
}

/// Format a timestamp for storage.
pub fn format_db(ts: NaiveDateTime) -> String {
    ts.format(DB_FORMAT).to_string()
}

/// Format a timestamp as a compact version-like stamp.
pub fn format_compact(ts: NaiveDateTime) -> String {
    ts.format(COMPACT_FORMAT).to_string()
}

/// Convert a reported duration in seconds to a time delta.
///
/// Returns `None` for non-finite or negative values; callers treat that as
/// a structural error in the report.
pub fn seconds_to_delta(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let nanos = (secs * 1e9).round();
    if nanos > i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(nanos as i64))
}
