//! Active Directory timestamp encodings
//!
//! Two encodings are in use: FILETIME integers (100 ns ticks since
//! 1601-01-01 UTC) for "large integer" attributes such as `pwdLastSet`, and
//! generalized time strings for attributes such as `whenCreated`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// 100 ns ticks between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count of 9999-12-31T23:59:59.9999999Z, the latest representable
/// instant. Directories use it and anything above (notably `i64::MAX`) to
/// mean "never".
pub const FILETIME_NEVER_THRESHOLD: i64 = 2_650_467_743_999_999_999;

const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%S%.fZ";

/// Convert a FILETIME tick count to a UTC instant.
///
/// Returns `None` for negative values and for values at or above
/// [`FILETIME_NEVER_THRESHOLD`]; callers keep those as raw integers.
pub fn filetime_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if !(0..FILETIME_NEVER_THRESHOLD).contains(&ticks) {
        return None;
    }

    let since_unix = ticks - FILETIME_UNIX_EPOCH_TICKS;
    let seconds = since_unix.div_euclid(TICKS_PER_SECOND);
    let nanos = since_unix.rem_euclid(TICKS_PER_SECOND) * 100;

    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
}

/// Parse a generalized time string of the form `yyyyMMddHHmmss.fZ`.
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), GENERALIZED_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
