//! RateLimitService port - shared hourly/daily quota store.
//!
//! Counters live outside the process so limits survive reloads and are
//! shared across every session for the same identity.

use async_trait::async_trait;

use crate::domain::foundation::{ChatDomain, Identity, RateLimitSessionId};
use crate::domain::rate_limit::RateLimitWindow;

/// Port for quota bookkeeping.
///
/// Implementations must make `update_message_count` an atomic
/// check-and-increment: a message that would exceed either limit is
/// rejected and leaves the counters untouched.
#[async_trait]
pub trait RateLimitService: Send + Sync {
    /// Current usage for `identity`, after applying any window rollover.
    async fn check_conversation_limits(
        &self,
        identity: &Identity,
    ) -> Result<RateLimitWindow, RateLimitError>;

    /// Opens a quota session for a new conversation.
    async fn start_conversation(
        &self,
        domain: ChatDomain,
        identity: &Identity,
    ) -> Result<StartedConversation, RateLimitError>;

    /// Counts one user message against the session's identity.
    async fn update_message_count(
        &self,
        session_id: RateLimitSessionId,
    ) -> Result<MessageCountUpdate, RateLimitError>;

    /// Closes a quota session. Counts are kept.
    async fn end_conversation(&self, session_id: RateLimitSessionId) -> Result<(), RateLimitError>;
}

/// Outcome of `start_conversation`.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedConversation {
    pub allowed: bool,
    /// Present only when `allowed`.
    pub session_id: Option<RateLimitSessionId>,
    pub limits: RateLimitWindow,
}

/// Outcome of `update_message_count`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageCountUpdate {
    /// Counted; the window reflects the increment.
    Accepted(RateLimitWindow),
    /// Not counted; the window is already full.
    Rejected(RateLimitWindow),
}

impl MessageCountUpdate {
    pub fn window(&self) -> &RateLimitWindow {
        match self {
            MessageCountUpdate::Accepted(w) | MessageCountUpdate::Rejected(w) => w,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MessageCountUpdate::Accepted(_))
    }
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),

    /// The quota session does not exist (expired or never started).
    #[error("unknown rate limit session: {0}")]
    UnknownSession(RateLimitSessionId),

    /// Stored data could not be read back.
    #[error("corrupt rate limit record: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::rate_limit::{RateLimits, UsageCounter};

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RateLimitService) {}

    #[test]
    fn update_exposes_window_for_both_outcomes() {
        let identity = Identity::email("a@x.com").unwrap();
        let window = UsageCounter::new(Timestamp::now()).window(&identity, RateLimits::default());

        let accepted = MessageCountUpdate::Accepted(window.clone());
        let rejected = MessageCountUpdate::Rejected(window.clone());

        assert!(accepted.is_accepted());
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.window(), &window);
    }

    #[test]
    fn errors_display_context() {
        let err = RateLimitError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "rate limiter unavailable: connection refused");
    }
}
