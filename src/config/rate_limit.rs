//! Quota configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::rate_limit::{RateLimits, DEFAULT_DAILY_LIMIT, DEFAULT_HOURLY_LIMIT};

/// Per-identity message quotas
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    #[serde(default = "default_hourly_limit")]
    pub hourly_limit: u32,

    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
}

impl RateLimitConfig {
    pub fn limits(&self) -> RateLimits {
        RateLimits::new(self.hourly_limit, self.daily_limit)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hourly_limit == 0 || self.daily_limit == 0 || self.hourly_limit > self.daily_limit {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            hourly_limit: default_hourly_limit(),
            daily_limit: default_daily_limit(),
        }
    }
}

fn default_hourly_limit() -> u32 {
    DEFAULT_HOURLY_LIMIT
}

fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}
