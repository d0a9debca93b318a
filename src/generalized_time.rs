//! Directory generalized-time codec.
//!
//! Timestamps such as `passwordExpirationTime` and `loginTime` are stored as
//! `YYYYMMDDHHMMSSZ`. Parsing also accepts an optional fractional-seconds part and a
//! `+hhmm`/`-hhmm` offset in place of `Z`; formatting always produces the UTC form with
//! whole seconds, which is what the directory writes itself.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::error::{DirectoryError, DirectoryResult};

/// Value written to reset-time attributes to mean "long ago".
pub const EPOCH_SENTINEL: &str = "19700101010101Z";

const BASE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parse a generalized-time string into UTC.
pub fn parse(value: &str) -> DirectoryResult<DateTime<Utc>> {
    let value = value.trim();
    let (local, offset) = split_offset(value).ok_or_else(|| invalid(value))?;

    let (base, fraction) = match local.split_once(['.', ',']) {
        Some((base, fraction)) => (base, Some(fraction)),
        None => (local, None),
    };

    let mut naive = NaiveDateTime::parse_from_str(base, BASE_FORMAT).map_err(|_| invalid(value))?;
    if let Some(fraction) = fraction {
        naive += fraction_to_duration(fraction).ok_or_else(|| invalid(value))?;
    }

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| invalid(value))
}

/// Format a UTC timestamp as generalized time.
pub fn format(value: &DateTime<Utc>) -> String {
    value.format("%Y%m%d%H%M%SZ").to_string()
}

/// The sentinel as a timestamp.
pub fn epoch_sentinel() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1970, 1, 1, 1, 1, 1)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn split_offset(value: &str) -> Option<(&str, FixedOffset)> {
    if let Some(local) = value.strip_suffix(['Z', 'z']) {
        return Some((local, FixedOffset::east_opt(0)?));
    }

    let sign_at = value.rfind(['+', '-'])?;
    let (local, offset) = value.split_at(sign_at);
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let digits = &offset[1..];
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some((local, offset))
}

fn fraction_to_duration(fraction: &str) -> Option<Duration> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Nanosecond precision; extra digits are dropped.
    let digits: String = fraction.chars().take(9).collect();
    let scale = 10_i64.pow(9 - digits.len() as u32);
    let nanos: i64 = digits.parse().ok()?;
    Some(Duration::nanoseconds(nanos * scale))
}

fn invalid(value: &str) -> DirectoryError {
    DirectoryError::operation(format!("Invalid generalized time '{}'", value))
}
