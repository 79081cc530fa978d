use chrono::{DateTime, SubsecRound, Utc};

/// Seconds between the Unix epoch and 0001-01-01T00:00:00Z.
const ZERO_TIME_UNIX_SECS: i64 = -62_135_596_800;

/// The "unset" timestamp: midnight UTC on January 1st of year 1.
///
/// Records bound from requests carry this value for timestamp fields the
/// client did not supply, and it serializes as `0001-01-01T00:00:00Z`.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ZERO_TIME_UNIX_SECS, 0).unwrap_or_default()
}

pub fn is_zero_time(value: &DateTime<Utc>) -> bool {
    *value == zero_time()
}

/// Drop sub-second precision.
pub fn truncate_to_second(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(0)
}
