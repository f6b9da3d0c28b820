// src/utils/time.rs

//! Timestamp helpers.

use chrono::Utc;

/// Current UTC time as milliseconds since the Unix epoch.
///
/// This is the timestamp format CloudWatch Logs expects for log events.
pub fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_monotonic_enough() {
        let a = timestamp_millis();
        let b = timestamp_millis();
        assert!(b >= a);
        // Sanity: after 2020-01-01.
        assert!(a > 1_577_836_800_000);
    }
}
