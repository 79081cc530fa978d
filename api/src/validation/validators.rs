//! Field validators for bound request records
//!
//! Each validator returns `Err(message)` describing the violated rule; the
//! binder attaches the field name.

use binder_shared::time::is_zero_time;
use chrono::{DateTime, Utc};

/// Validate that a text value is present and non-empty
pub fn validate_required(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err("is required".to_string()),
    }
}

/// Validate that a timestamp is present and not the zero time
pub fn validate_required_time(value: Option<&DateTime<Utc>>) -> Result<(), String> {
    match value {
        Some(t) if !is_zero_time(t) => Ok(()),
        _ => Err("is required".to_string()),
    }
}

/// Validate string length within bounds, counted in characters
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!("must be at least {} characters", min));
    }
    if len > max {
        return Err(format!("must be at most {} characters", max));
    }
    Ok(())
}

/// Validate that `value` is strictly later than `other` (`other_field` names it
/// in the message). An unset `value` always passes.
pub fn validate_after(
    value: &DateTime<Utc>,
    other: &DateTime<Utc>,
    other_field: &str,
) -> Result<(), String> {
    if is_zero_time(value) || value > other {
        return Ok(());
    }
    Err(format!("must be after {}", other_field))
}

/// Validate that a timestamp is not later than `now`. An unset value passes.
pub fn validate_not_after(value: &DateTime<Utc>, now: &DateTime<Utc>) -> Result<(), String> {
    if is_zero_time(value) || value <= now {
        return Ok(());
    }
    Err("must not be in the future".to_string())
}
