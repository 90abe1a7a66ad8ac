//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Self {
        use chrono::TimeZone;
        Self(Utc.timestamp_opt(secs, 0).unwrap())
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a new timestamp by subtracting the specified number of seconds.
    pub fn minus_secs(&self, secs: i64) -> Self {
        Self(self.0 - Duration::seconds(secs))
    }

    /// Returns the given wall-clock hour (UTC, on the hour) of the day
    /// after this timestamp's date.
    pub fn following_day_at(&self, hour: u32) -> Self {
        let next = (self.0 + Duration::days(1)).date_naive();
        Self(next.and_hms_opt(hour, 0, 0).unwrap().and_utc())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_helpers_agree_with_ord() {
        let earlier = Timestamp::from_unix_secs(1_700_000_000);
        let later = earlier.plus_secs(60);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
    }

    #[test]
    fn unix_seconds_roundtrip() {
        let ts = Timestamp::from_unix_secs(1_700_000_000);
        assert_eq!(ts.as_unix_secs(), 1_700_000_000);
    }

    #[test]
    fn duration_since_is_signed() {
        let earlier = Timestamp::from_unix_secs(100);
        let later = Timestamp::from_unix_secs(160);
        assert_eq!(later.duration_since(&earlier).num_seconds(), 60);
        assert_eq!(earlier.duration_since(&later).num_seconds(), -60);
    }

    #[test]
    fn following_day_at_lands_on_the_next_calendar_day() {
        // 2023-11-14 22:13:20 UTC
        let ts = Timestamp::from_unix_secs(1_700_000_000);
        let expiry = ts.following_day_at(5);
        let dt = expiry.as_datetime();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-11-15 05:00:00");
    }
}
