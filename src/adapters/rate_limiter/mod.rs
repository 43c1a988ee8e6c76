//! Rate limit service adapters.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimitService` - In-memory for testing and single-process use
//! - `RedisRateLimitService` - Redis-backed, shared across processes
//!
//! ## Usage
//!
//! ```ignore
//! use chat_orchestrator::adapters::rate_limiter::InMemoryRateLimitService;
//!
//! // For testing
//! let service = InMemoryRateLimitService::with_defaults();
//!
//! // For production
//! let service = RedisRateLimitService::new(conn, RateLimits::new(20, 100));
//! ```

mod in_memory;
mod redis;

pub use self::redis::{RedisRateLimitService, DEFAULT_KEY_PREFIX};
pub use in_memory::InMemoryRateLimitService;
