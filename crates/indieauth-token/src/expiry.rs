//! Time helpers: expiration strings and the expiry predicate

use std::time::Duration;

use chrono::Utc;

use crate::error::{Error, Result};

/// Current time in UNIX seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Current time in UNIX milliseconds
pub fn unix_now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whether a token with expiration `exp` is expired at `now`
///
/// Strict: a token is still valid during the second named by `exp`.
pub fn is_expired(exp: i64, now: i64) -> bool {
    now > exp
}

/// Parse a human-readable duration such as `"15 minutes"` or `"1 hour"`
///
/// Accepts everything `humantime` does (`"30d"`, `"1h 30m"`, `"2 weeks"`).
///
/// # Errors
///
/// Returns [`Error::InvalidExpiration`] for unparseable or zero durations.
pub fn parse_expiration(value: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(value.trim()).map_err(|e| Error::InvalidExpiration {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if duration.is_zero() {
        return Err(Error::InvalidExpiration {
            value: value.to_string(),
            reason: "duration must be positive".to_string(),
        });
    }
    Ok(duration)
}

/// Whole seconds in an expiration string
///
/// # Errors
///
/// Same as [`parse_expiration`].
pub fn expiration_secs(value: &str) -> Result<i64> {
    let secs = parse_expiration(value)?.as_secs();
    i64::try_from(secs).map_err(|_| too_large(value))
}

/// Whole milliseconds in an expiration string
///
/// # Errors
///
/// Same as [`parse_expiration`].
pub fn expiration_millis(value: &str) -> Result<i64> {
    let millis = parse_expiration(value)?.as_millis();
    i64::try_from(millis).map_err(|_| too_large(value))
}

/// `now + lifetime`, refusing results that do not fit an `i64`
///
/// # Errors
///
/// Returns [`Error::InvalidExpiration`] for `value` when the sum overflows.
pub fn expires_at(value: &str, now: i64, lifetime: i64) -> Result<i64> {
    now.checked_add(lifetime).ok_or_else(|| too_large(value))
}

fn too_large(value: &str) -> Error {
    Error::InvalidExpiration {
        value: value.to_string(),
        reason: "duration too large".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_boundary() {
        assert!(!is_expired(100, 99));
        assert!(!is_expired(100, 100));
        assert!(is_expired(100, 101));
    }

    #[test]
    fn test_parse_human_durations() {
        assert_eq!(expiration_secs("15 minutes").unwrap(), 900);
        assert_eq!(expiration_secs("1 hour").unwrap(), 3600);
        assert_eq!(expiration_secs("30d").unwrap(), 30 * 86_400);
        assert_eq!(expiration_secs("1h 30m").unwrap(), 5400);
        assert_eq!(expiration_millis("1 second").unwrap(), 1000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_expiration("soon"),
            Err(Error::InvalidExpiration { .. })
        ));
        assert!(parse_expiration("").is_err());
        assert!(parse_expiration("0s").is_err());
    }

    #[test]
    fn test_expires_at_overflow() {
        assert_eq!(expires_at("1 hour", 100, 3600).unwrap(), 3700);
        assert!(matches!(
            expires_at("forever", i64::MAX - 10, 11),
            Err(Error::InvalidExpiration { .. })
        ));
        // Fits u64 seconds but not i64 milliseconds
        assert!(expiration_millis("9223372036854776s").is_err());
    }
}
