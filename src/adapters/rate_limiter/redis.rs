//! Redis-backed rate limit service for production deployments.
//!
//! Uses fixed-window counters keyed by identity and window start, maintained
//! with INCR + EXPIRE so every process sees the same counts.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;

use crate::domain::foundation::{
    ChatDomain, Clock, Identity, RateLimitSessionId, SystemClock, Timestamp,
};
use crate::domain::rate_limit::{RateLimitWindow, RateLimits, UsageCounter};
use crate::ports::{MessageCountUpdate, RateLimitError, RateLimitService, StartedConversation};

/// Default namespace for quota keys.
pub const DEFAULT_KEY_PREFIX: &str = "chat:rl";
const HOUR_TTL_SECS: i64 = 3_600 + 60;
const DAY_TTL_SECS: i64 = 86_400 + 60;
const SESSION_TTL_SECS: u64 = 86_400;

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotaKeys {
    prefix: String,
}

impl QuotaKeys {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn hourly_key(&self, identity: &Identity, now: Timestamp) -> String {
        format!("{}:{}:h:{}", self.prefix, identity.key(), now.start_of_hour().as_unix_secs())
    }

    fn daily_key(&self, identity: &Identity, now: Timestamp) -> String {
        format!("{}:{}:d:{}", self.prefix, identity.key(), now.start_of_day().as_unix_secs())
    }

    fn session_key(&self, session_id: RateLimitSessionId) -> String {
        format!("{}:session:{}", self.prefix, session_id)
    }
}

/// Redis-backed quota store.
///
/// Check-and-increment works by incrementing both counters in one atomic
/// pipeline and rolling the increment back when either exceeds its limit,
/// so an accepted message never leaves a count above the limit.
#[derive(Clone)]
pub struct RedisRateLimitService {
    conn: MultiplexedConnection,
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    keys: QuotaKeys,
}

impl RedisRateLimitService {
    pub fn new(conn: MultiplexedConnection, limits: RateLimits) -> Self {
        Self {
            conn,
            limits,
            clock: Arc::new(SystemClock),
            keys: QuotaKeys::new(DEFAULT_KEY_PREFIX),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Namespaces every key under `prefix` (several deployments can share one Redis).
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keys = QuotaKeys::new(prefix);
        self
    }

    fn to_count(value: i64) -> u32 {
        u32::try_from(value.max(0)).unwrap_or(u32::MAX)
    }

    async fn read_window(&self, identity: &Identity) -> Result<RateLimitWindow, RateLimitError> {
        let now = self.clock.now();
        let mut conn = self.conn.clone();

        let (hourly, daily): (Option<i64>, Option<i64>) = redis::pipe()
            .get(self.keys.hourly_key(identity, now))
            .get(self.keys.daily_key(identity, now))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let counter = UsageCounter::restore(
            now,
            Self::to_count(hourly.unwrap_or(0)),
            Self::to_count(daily.unwrap_or(0)),
        );
        Ok(counter.window(identity, self.limits))
    }

    async fn identity_for(&self, session_id: RateLimitSessionId) -> Result<Identity, RateLimitError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.keys.session_key(session_id))
            .await
            .map_err(unavailable)?;
        let raw = raw.ok_or(RateLimitError::UnknownSession(session_id))?;
        serde_json::from_str(&raw).map_err(|e| RateLimitError::Corrupt(e.to_string()))
    }
}

impl std::fmt::Debug for RedisRateLimitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimitService")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimitService for RedisRateLimitService {
    async fn check_conversation_limits(
        &self,
        identity: &Identity,
    ) -> Result<RateLimitWindow, RateLimitError> {
        self.read_window(identity).await
    }

    async fn start_conversation(
        &self,
        domain: ChatDomain,
        identity: &Identity,
    ) -> Result<StartedConversation, RateLimitError> {
        let limits = self.read_window(identity).await?;
        if !limits.allowed() {
            return Ok(StartedConversation {
                allowed: false,
                session_id: None,
                limits,
            });
        }

        let session_id = RateLimitSessionId::new();
        let payload =
            serde_json::to_string(identity).map_err(|e| RateLimitError::Corrupt(e.to_string()))?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.keys.session_key(session_id))
            .arg(payload)
            .arg("EX")
            .arg(SESSION_TTL_SECS)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;

        tracing::debug!(%session_id, %domain, identity = %identity.redacted(), "Rate limit session started");
        Ok(StartedConversation {
            allowed: true,
            session_id: Some(session_id),
            limits,
        })
    }

    async fn update_message_count(
        &self,
        session_id: RateLimitSessionId,
    ) -> Result<MessageCountUpdate, RateLimitError> {
        let identity = self.identity_for(session_id).await?;
        let now = self.clock.now();
        let hourly_key = self.keys.hourly_key(&identity, now);
        let daily_key = self.keys.daily_key(&identity, now);
        let mut conn = self.conn.clone();

        let (hourly, daily): (i64, i64) = redis::pipe()
            .atomic()
            .incr(&hourly_key, 1_i64)
            .expire(&hourly_key, HOUR_TTL_SECS)
            .ignore()
            .incr(&daily_key, 1_i64)
            .expire(&daily_key, DAY_TTL_SECS)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let (hourly, daily) = (Self::to_count(hourly), Self::to_count(daily));
        if hourly > self.limits.hourly_limit || daily > self.limits.daily_limit {
            redis::pipe()
                .atomic()
                .decr(&hourly_key, 1_i64)
                .ignore()
                .decr(&daily_key, 1_i64)
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(unavailable)?;
            let counter = UsageCounter::restore(now, hourly.saturating_sub(1), daily.saturating_sub(1));
            return Ok(MessageCountUpdate::Rejected(counter.window(&identity, self.limits)));
        }

        let counter = UsageCounter::restore(now, hourly, daily);
        Ok(MessageCountUpdate::Accepted(counter.window(&identity, self.limits)))
    }

    async fn end_conversation(&self, session_id: RateLimitSessionId) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.keys.session_key(session_id))
            .await
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-15T10:42:00Z
    const NOW: u64 = 1_705_312_800 + 42 * 60;

    #[test]
    fn keys_are_scoped_by_identity_and_window_start() {
        let keys = QuotaKeys::new(DEFAULT_KEY_PREFIX);
        let identity = Identity::email("a@x.com").unwrap();
        let now = Timestamp::from_unix_secs(NOW);
        assert_eq!(
            keys.hourly_key(&identity, now),
            "chat:rl:email:a@x.com:h:1705312800"
        );
        assert_eq!(
            keys.daily_key(&identity, now),
            "chat:rl:email:a@x.com:d:1705276800"
        );
    }

    #[test]
    fn session_key_uses_session_id() {
        let keys = QuotaKeys::new(DEFAULT_KEY_PREFIX);
        let id = RateLimitSessionId::new();
        assert_eq!(
            keys.session_key(id),
            format!("chat:rl:session:{}", id)
        );
    }

    #[test]
    fn custom_prefix_namespaces_every_key() {
        let keys = QuotaKeys::new("staging:quota");
        let id = RateLimitSessionId::new();
        assert!(keys.session_key(id).starts_with("staging:quota:session:"));
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(RedisRateLimitService::to_count(-3), 0);
        assert_eq!(RedisRateLimitService::to_count(7), 7);
    }
}
