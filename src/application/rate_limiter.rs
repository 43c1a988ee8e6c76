//! RateLimiter - the engine's quota gate over `RateLimitService`.
//!
//! Keeps the quota session handle for each identity and turns every
//! backend failure into an "allowed, window unknown" answer.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{ChatDomain, Identity, RateLimitSessionId};
use crate::domain::rate_limit::RateLimitWindow;
use crate::ports::{MessageCountUpdate, RateLimitError, RateLimitService};

/// Answer to "may this identity chat right now?".
#[derive(Debug, Clone, PartialEq)]
pub struct LimitCheck {
    pub allowed: bool,
    /// `None` when the backend could not be reached.
    pub window: Option<RateLimitWindow>,
}

impl LimitCheck {
    fn fail_open() -> Self {
        Self {
            allowed: true,
            window: None,
        }
    }
}

/// Answer to "may this identity open a conversation?".
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationAdmission {
    pub allowed: bool,
    pub window: Option<RateLimitWindow>,
}

/// Outcome of counting one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageAdmission {
    /// Counted (window known) or let through because the backend failed.
    Accepted(Option<RateLimitWindow>),
    /// Over a limit; nothing was counted and nothing may be dispatched.
    Rejected(RateLimitWindow),
}

impl MessageAdmission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MessageAdmission::Accepted(_))
    }
}

/// Per-identity hourly/daily quota gate.
pub struct RateLimiter {
    service: Arc<dyn RateLimitService>,
    sessions: Mutex<HashMap<Identity, RateLimitSessionId>>,
}

impl RateLimiter {
    pub fn new(service: Arc<dyn RateLimitService>) -> Self {
        Self {
            service,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Checks current usage. Called before a conversation starts and before
    /// every send.
    pub async fn check_limits(&self, identity: &Identity) -> LimitCheck {
        match self.service.check_conversation_limits(identity).await {
            Ok(window) => LimitCheck {
                allowed: window.allowed(),
                window: Some(window),
            },
            Err(e) => {
                tracing::warn!(identity = %identity.redacted(), error = %e, "Rate limit check failed, allowing");
                LimitCheck::fail_open()
            }
        }
    }

    /// Opens a quota session for a new conversation.
    pub async fn start_conversation(
        &self,
        domain: ChatDomain,
        identity: &Identity,
    ) -> ConversationAdmission {
        match self.service.start_conversation(domain, identity).await {
            Ok(started) => {
                if let Some(session_id) = started.session_id {
                    self.sessions.lock().await.insert(identity.clone(), session_id);
                }
                ConversationAdmission {
                    allowed: started.allowed,
                    window: Some(started.limits),
                }
            }
            Err(e) => {
                tracing::warn!(identity = %identity.redacted(), error = %e, "Rate limit session start failed, allowing");
                ConversationAdmission {
                    allowed: true,
                    window: None,
                }
            }
        }
    }

    /// Counts one user message before it is dispatched.
    ///
    /// A session the backend no longer knows (expired, flushed) is reopened
    /// and the count retried once, so metering continues.
    pub async fn record_message(&self, domain: ChatDomain, identity: &Identity) -> MessageAdmission {
        let session_id = self.sessions.lock().await.get(identity).copied();
        let Some(session_id) = session_id else {
            tracing::warn!(identity = %identity.redacted(), "No quota session for identity, allowing");
            return MessageAdmission::Accepted(None);
        };

        match self.service.update_message_count(session_id).await {
            Err(RateLimitError::UnknownSession(_)) => {
                tracing::warn!(identity = %identity.redacted(), %session_id, "Quota session expired, reopening");
                self.sessions.lock().await.remove(identity);
                self.recount(domain, identity).await
            }
            result => Self::admission(identity, result),
        }
    }

    async fn recount(&self, domain: ChatDomain, identity: &Identity) -> MessageAdmission {
        let admission = self.start_conversation(domain, identity).await;
        if !admission.allowed {
            if let Some(window) = admission.window {
                return MessageAdmission::Rejected(window);
            }
        }
        let session_id = self.sessions.lock().await.get(identity).copied();
        match session_id {
            Some(session_id) => {
                let result = self.service.update_message_count(session_id).await;
                Self::admission(identity, result)
            }
            None => MessageAdmission::Accepted(None),
        }
    }

    fn admission(
        identity: &Identity,
        result: Result<MessageCountUpdate, RateLimitError>,
    ) -> MessageAdmission {
        match result {
            Ok(MessageCountUpdate::Accepted(window)) => MessageAdmission::Accepted(Some(window)),
            Ok(MessageCountUpdate::Rejected(window)) => MessageAdmission::Rejected(window),
            Err(e) => {
                tracing::warn!(identity = %identity.redacted(), error = %e, "Message count update failed, allowing");
                MessageAdmission::Accepted(None)
            }
        }
    }

    /// Closes the identity's quota session, if one is open.
    pub async fn end_conversation(&self, identity: &Identity) {
        let session_id = self.sessions.lock().await.remove(identity);
        if let Some(session_id) = session_id {
            if let Err(e) = self.service.end_conversation(session_id).await {
                tracing::warn!(identity = %identity.redacted(), error = %e, "Failed to end quota session");
            }
        }
    }

    pub async fn has_session(&self, identity: &Identity) -> bool {
        self.sessions.lock().await.contains_key(identity)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::InMemoryRateLimitService;
    use crate::domain::foundation::ManualClock;
    use crate::domain::rate_limit::RateLimits;
    use crate::ports::StartedConversation;
    use async_trait::async_trait;

    struct BrokenService;

    #[async_trait]
    impl RateLimitService for BrokenService {
        async fn check_conversation_limits(
            &self,
            _identity: &Identity,
        ) -> Result<RateLimitWindow, RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".into()))
        }

        async fn start_conversation(
            &self,
            _domain: ChatDomain,
            _identity: &Identity,
        ) -> Result<StartedConversation, RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".into()))
        }

        async fn update_message_count(
            &self,
            _session_id: RateLimitSessionId,
        ) -> Result<MessageCountUpdate, RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".into()))
        }

        async fn end_conversation(&self, _session_id: RateLimitSessionId) -> Result<(), RateLimitError> {
            Err(RateLimitError::Unavailable("redis down".into()))
        }
    }

    fn identity() -> Identity {
        Identity::email("a@x.com").unwrap()
    }

    fn limiter_with(limits: RateLimits) -> (RateLimiter, Arc<InMemoryRateLimitService>) {
        let clock = Arc::new(ManualClock::at_unix_secs(1_705_276_800));
        let service = Arc::new(InMemoryRateLimitService::with_clock(limits, clock));
        (RateLimiter::new(service.clone()), service)
    }

    #[tokio::test]
    async fn identity_at_limit_is_not_allowed() {
        let (limiter, service) = limiter_with(RateLimits::new(2, 100));
        service.seed_usage(&identity(), 2, 2).await;

        let check = limiter.check_limits(&identity()).await;

        assert!(!check.allowed);
        let window = check.window.unwrap();
        assert_eq!(window.hourly_count, 2);
        assert_eq!(window.hourly_limit, 2);
    }

    #[tokio::test]
    async fn messages_are_counted_through_the_session() {
        let (limiter, _) = limiter_with(RateLimits::new(2, 100));
        let admission = limiter.start_conversation(ChatDomain::Technology, &identity()).await;
        assert!(admission.allowed);

        assert!(limiter.record_message(ChatDomain::Technology, &identity()).await.is_accepted());
        assert!(limiter.record_message(ChatDomain::Technology, &identity()).await.is_accepted());
        match limiter.record_message(ChatDomain::Technology, &identity()).await {
            MessageAdmission::Rejected(window) => assert_eq!(window.hourly_count, 2),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn backend_failures_fail_open() {
        let limiter = RateLimiter::new(Arc::new(BrokenService));

        let check = limiter.check_limits(&identity()).await;
        assert!(check.allowed);
        assert!(check.window.is_none());

        let admission = limiter.start_conversation(ChatDomain::Healthcare, &identity()).await;
        assert!(admission.allowed);
        assert_eq!(limiter.record_message(ChatDomain::Technology, &identity()).await, MessageAdmission::Accepted(None));
    }

    #[tokio::test]
    async fn expired_session_is_reopened_and_still_counted() {
        let (limiter, service) = limiter_with(RateLimits::new(5, 100));
        limiter.start_conversation(ChatDomain::Technology, &identity()).await;
        assert!(limiter.record_message(ChatDomain::Technology, &identity()).await.is_accepted());

        // Backend forgets every session, as when the session key's TTL lapses.
        let stale = limiter.sessions.lock().await[&identity()];
        service.end_conversation(stale).await.unwrap();

        match limiter.record_message(ChatDomain::Technology, &identity()).await {
            MessageAdmission::Accepted(Some(window)) => assert_eq!(window.hourly_count, 2),
            other => panic!("expected a counted message, got {:?}", other),
        }
        assert!(limiter.has_session(&identity()).await);
        assert_ne!(limiter.sessions.lock().await[&identity()], stale);

        match limiter.record_message(ChatDomain::Technology, &identity()).await {
            MessageAdmission::Accepted(Some(window)) => assert_eq!(window.hourly_count, 3),
            other => panic!("expected a counted message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reopened_session_over_limit_is_rejected() {
        let (limiter, service) = limiter_with(RateLimits::new(1, 100));
        limiter.start_conversation(ChatDomain::Technology, &identity()).await;
        assert!(limiter.record_message(ChatDomain::Technology, &identity()).await.is_accepted());

        let stale = limiter.sessions.lock().await[&identity()];
        service.end_conversation(stale).await.unwrap();

        assert!(!limiter.record_message(ChatDomain::Technology, &identity()).await.is_accepted());
    }

    #[tokio::test]
    async fn end_conversation_forgets_session() {
        let (limiter, service) = limiter_with(RateLimits::default());
        limiter.start_conversation(ChatDomain::Technology, &identity()).await;
        assert!(limiter.has_session(&identity()).await);

        limiter.end_conversation(&identity()).await;

        assert!(!limiter.has_session(&identity()).await);
        assert_eq!(service.open_sessions().await, 0);
    }
}
