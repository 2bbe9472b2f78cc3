//! Date histogram bucket arithmetic.
//!
//! All values are epoch milliseconds. Seconds only show up when an offset is
//! rendered for the wire.

use crate::error::{Result, ValidationError};

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Largest timestamp accepted in a time range, 9999-12-31T23:59:59.999Z
pub const MAX_EPOCH_MILLIS: i64 = 253_402_300_799_999;
/// Smallest timestamp accepted in a time range
pub const MIN_EPOCH_MILLIS: i64 = -MAX_EPOCH_MILLIS;

/// A parsed bucket interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Width of a bucket in milliseconds, always positive
    pub millis: i64,
    /// The expression the interval was parsed from, passed through to the query
    pub expression: String,
}

impl Interval {
    /// Offset that puts a bucket boundary exactly at `end`
    pub fn offset_for(&self, end: i64) -> i64 {
        calculate_offset(end, self.millis)
    }
}

/// Parse an interval expression such as "10s", "1m" or "500ms"
pub fn parse_interval(expression: &str) -> Result<Interval> {
    let invalid = || ValidationError::InvalidInterval {
        interval: expression.to_string(),
    };

    let trimmed = expression.trim();
    let pos = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (num_str, unit_str) = trimmed.split_at(pos);

    let value: i64 = num_str.parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid().into());
    }

    let unit = match unit_str {
        "ms" => 1,
        "s" => SECOND,
        "m" => MINUTE,
        "h" => HOUR,
        "d" => DAY,
        "w" => WEEK,
        _ => return Err(invalid().into()),
    };

    let millis = value.checked_mul(unit).ok_or_else(invalid)?;

    Ok(Interval {
        millis,
        expression: trimmed.to_string(),
    })
}

/// Start of the bucket that contains `value`, for buckets of width
/// `interval` shifted by `offset`. Saturates at `i64::MIN` when that bucket
/// starts below it.
pub fn get_bucket_key(value: i64, interval: i64, offset: i64) -> i64 {
    debug_assert!(interval > 0, "bucket interval must be positive");
    // Widened so that `value - offset` cannot overflow. The remainder is
    // below `interval` and fits back into i64.
    let shifted = i128::from(value) - i128::from(offset);
    let into_bucket = shifted.rem_euclid(i128::from(interval)) as i64;
    value.saturating_sub(into_bucket)
}

/// Shift of the bucket grid that makes a bucket edge land on `end`.
///
/// The result lies in `[-interval, 0)`.
pub fn calculate_offset(end: i64, interval: i64) -> i64 {
    // end - interval - get_bucket_key(end, interval, 0), without the
    // intermediate values that overflow near the ends of the i64 range
    end.rem_euclid(interval) - interval
}

/// Render an offset in whole seconds, rounding towards negative infinity
pub fn format_offset(offset_millis: i64) -> String {
    format!("{}s", offset_millis.div_euclid(SECOND))
}
