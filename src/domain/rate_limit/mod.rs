//! Rate limit module - hourly/daily quota windows per identity.
//!
//! Pure window arithmetic lives here; the stores that share counters across
//! sessions sit behind the `RateLimitService` port.

mod window;

pub use window::{
    RateLimitWindow, RateLimits, UsageCounter, DEFAULT_DAILY_LIMIT, DEFAULT_HOURLY_LIMIT,
};
