//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

    /// Creates a timestamp from Unix seconds.
    ///
    /// Out-of-range values clamp to the Unix epoch.
    pub fn from_unix_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    /// Returns the timestamp as Unix seconds (0 for pre-epoch values).
    pub fn as_unix_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1_000)))
    }

    /// Start of the wall-clock hour containing this timestamp.
    pub fn start_of_hour(&self) -> Self {
        let secs = self.0.timestamp();
        Self::from_signed_secs(secs - secs.rem_euclid(SECS_PER_HOUR))
    }

    /// Start of the UTC day containing this timestamp.
    pub fn start_of_day(&self) -> Self {
        let secs = self.0.timestamp();
        Self::from_signed_secs(secs - secs.rem_euclid(SECS_PER_DAY))
    }

    /// The first hour boundary strictly after the start of this hour.
    pub fn next_hour_boundary(&self) -> Self {
        Self(self.start_of_hour().0 + Duration::seconds(SECS_PER_HOUR))
    }

    /// The next UTC midnight.
    pub fn next_day_boundary(&self) -> Self {
        Self(self.start_of_day().0 + Duration::seconds(SECS_PER_DAY))
    }

    /// Whole seconds from this timestamp until `later` (0 if already passed).
    pub fn secs_until(&self, later: &Timestamp) -> u64 {
        u64::try_from(later.duration_since(self).num_seconds()).unwrap_or(0)
    }

    fn from_signed_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
