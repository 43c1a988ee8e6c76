//! Quota window arithmetic.
//!
//! Windows roll over on wall-clock hour and UTC-day boundaries. Rollover is
//! lazy: a counter is refreshed when it is next read or written.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Identity, Timestamp};

/// Default number of messages per wall-clock hour.
pub const DEFAULT_HOURLY_LIMIT: u32 = 20;

/// Default number of messages per UTC day.
pub const DEFAULT_DAILY_LIMIT: u32 = 100;

/// Configured limits applied to every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub hourly_limit: u32,
    pub daily_limit: u32,
}

impl RateLimits {
    pub fn new(hourly_limit: u32, daily_limit: u32) -> Self {
        Self {
            hourly_limit,
            daily_limit,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new(DEFAULT_HOURLY_LIMIT, DEFAULT_DAILY_LIMIT)
    }
}

/// Snapshot of an identity's usage against its limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub identity: Identity,
    pub hourly_count: u32,
    pub hourly_limit: u32,
    pub daily_count: u32,
    pub daily_limit: u32,
    /// Next wall-clock hour boundary.
    pub reset_time: Timestamp,
    /// Next UTC midnight.
    pub daily_reset_time: Timestamp,
}

impl RateLimitWindow {
    /// True when there is room for one more message in both windows.
    pub fn allowed(&self) -> bool {
        self.hourly_count < self.hourly_limit && self.daily_count < self.daily_limit
    }

    pub fn hourly_remaining(&self) -> u32 {
        self.hourly_limit.saturating_sub(self.hourly_count)
    }

    pub fn daily_remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.daily_count)
    }

    /// Seconds until the exhausted window reopens (0 when allowed).
    ///
    /// If the daily window is exhausted the hourly reset does not help, so
    /// the daily reset wins.
    pub fn retry_after_secs(&self, now: &Timestamp) -> u64 {
        if self.daily_count >= self.daily_limit {
            now.secs_until(&self.daily_reset_time)
        } else if self.hourly_count >= self.hourly_limit {
            now.secs_until(&self.reset_time)
        } else {
            0
        }
    }
}

/// Mutable per-identity counters with lazy window rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    hour_start: Timestamp,
    day_start: Timestamp,
    hourly_count: u32,
    daily_count: u32,
}

impl UsageCounter {
    pub fn new(now: Timestamp) -> Self {
        Self {
            hour_start: now.start_of_hour(),
            day_start: now.start_of_day(),
            hourly_count: 0,
            daily_count: 0,
        }
    }

    /// Rebuilds a counter from stored counts, e.g. from a cache read.
    pub fn restore(now: Timestamp, hourly_count: u32, daily_count: u32) -> Self {
        Self {
            hourly_count,
            daily_count,
            ..Self::new(now)
        }
    }

    /// Drops counts whose window has passed.
    pub fn refresh(&mut self, now: Timestamp) {
        let hour_start = now.start_of_hour();
        if hour_start != self.hour_start {
            self.hour_start = hour_start;
            self.hourly_count = 0;
        }
        let day_start = now.start_of_day();
        if day_start != self.day_start {
            self.day_start = day_start;
            self.daily_count = 0;
        }
    }

    /// Atomic check-and-increment: records one message only if both windows
    /// have room. Returns whether the message was recorded.
    pub fn try_record(&mut self, now: Timestamp, limits: RateLimits) -> bool {
        self.refresh(now);
        if self.hourly_count < limits.hourly_limit && self.daily_count < limits.daily_limit {
            self.hourly_count += 1;
            self.daily_count += 1;
            true
        } else {
            false
        }
    }

    pub fn hourly_count(&self) -> u32 {
        self.hourly_count
    }

    pub fn daily_count(&self) -> u32 {
        self.daily_count
    }

    /// Snapshot against `limits` as seen at the counter's current window.
    pub fn window(&self, identity: &Identity, limits: RateLimits) -> RateLimitWindow {
        RateLimitWindow {
            identity: identity.clone(),
            hourly_count: self.hourly_count,
            hourly_limit: limits.hourly_limit,
            daily_count: self.daily_count,
            daily_limit: limits.daily_limit,
            reset_time: self.hour_start.next_hour_boundary(),
            daily_reset_time: self.day_start.next_day_boundary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2024-01-15T10:00:00Z
    const TEN_AM: u64 = 1_705_312_800;

    fn identity() -> Identity {
        Identity::email("a@x.com").unwrap()
    }

    #[test]
    fn window_at_hourly_limit_is_not_allowed() {
        let counter = UsageCounter::restore(Timestamp::from_unix_secs(TEN_AM), 2, 2);
        let window = counter.window(&identity(), RateLimits::new(2, 100));
        assert!(!window.allowed());
        assert_eq!(window.hourly_remaining(), 0);
    }

    #[test]
    fn window_below_both_limits_is_allowed() {
        let counter = UsageCounter::restore(Timestamp::from_unix_secs(TEN_AM), 1, 1);
        assert!(counter.window(&identity(), RateLimits::new(2, 2)).allowed());
    }

    #[test]
    fn try_record_rejects_without_incrementing() {
        let now = Timestamp::from_unix_secs(TEN_AM);
        let mut counter = UsageCounter::restore(now, 2, 2);
        assert!(!counter.try_record(now, RateLimits::new(2, 100)));
        assert_eq!(counter.hourly_count(), 2);
        assert_eq!(counter.daily_count(), 2);
    }

    #[test]
    fn hourly_count_resets_on_next_hour() {
        let now = Timestamp::from_unix_secs(TEN_AM + 3_599);
        let mut counter = UsageCounter::restore(now, 20, 20);
        counter.refresh(Timestamp::from_unix_secs(TEN_AM + 3_600));
        assert_eq!(counter.hourly_count(), 0);
        assert_eq!(counter.daily_count(), 20);
    }

    #[test]
    fn daily_count_resets_at_utc_midnight() {
        let now = Timestamp::from_unix_secs(TEN_AM);
        let mut counter = UsageCounter::restore(now, 3, 100);
        counter.refresh(Timestamp::from_unix_secs(TEN_AM + 14 * 3_600));
        assert_eq!(counter.daily_count(), 0);
        assert_eq!(counter.hourly_count(), 0);
    }

    #[test]
    fn reset_times_are_next_boundaries() {
        let now = Timestamp::from_unix_secs(TEN_AM + 1_234);
        let window = UsageCounter::new(now).window(&identity(), RateLimits::default());
        assert_eq!(window.reset_time.as_unix_secs(), TEN_AM + 3_600);
        assert_eq!(window.daily_reset_time.as_unix_secs(), TEN_AM + 14 * 3_600);
    }

    #[test]
    fn retry_after_prefers_daily_reset_when_day_is_exhausted() {
        let now = Timestamp::from_unix_secs(TEN_AM);
        let window = UsageCounter::restore(now, 5, 100).window(&identity(), RateLimits::new(5, 100));
        assert_eq!(window.retry_after_secs(&now), 14 * 3_600);

        let window = UsageCounter::restore(now, 5, 6).window(&identity(), RateLimits::new(5, 100));
        assert_eq!(window.retry_after_secs(&now), 3_600);
    }

    proptest! {
        #[test]
        fn accepted_messages_never_exceed_limits(
            hourly_limit in 0u32..30,
            daily_limit in 0u32..60,
            steps in proptest::collection::vec(0u64..1_800, 0..200),
        ) {
            let limits = RateLimits::new(hourly_limit, daily_limit);
            let mut secs = TEN_AM;
            let mut counter = UsageCounter::new(Timestamp::from_unix_secs(secs));
            for step in steps {
                secs += step;
                let now = Timestamp::from_unix_secs(secs);
                let recorded = counter.try_record(now, limits);
                if recorded {
                    prop_assert!(counter.hourly_count() <= hourly_limit);
                    prop_assert!(counter.daily_count() <= daily_limit);
                }
                if hourly_limit == 0 || daily_limit == 0 {
                    prop_assert!(!recorded);
                }
            }
        }
    }
}
