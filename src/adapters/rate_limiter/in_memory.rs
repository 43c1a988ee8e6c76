//! In-memory rate limit service for testing and single-process use.
//!
//! Counters live in a HashMap keyed by identity; sessions map to the
//! identity that opened them. Not shared across processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{ChatDomain, Clock, Identity, RateLimitSessionId, SystemClock};
use crate::domain::rate_limit::{RateLimitWindow, RateLimits, UsageCounter};
use crate::ports::{MessageCountUpdate, RateLimitError, RateLimitService, StartedConversation};

#[derive(Debug, Default)]
struct State {
    counters: HashMap<Identity, UsageCounter>,
    sessions: HashMap<RateLimitSessionId, Identity>,
}

/// In-memory quota store.
///
/// One lock guards counters and sessions so check-and-increment is atomic.
pub struct InMemoryRateLimitService {
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<State>>,
}

impl InMemoryRateLimitService {
    pub fn new(limits: RateLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimits::default())
    }

    /// Seeds counts for an identity in the current window (test helper).
    pub async fn seed_usage(&self, identity: &Identity, hourly_count: u32, daily_count: u32) {
        let now = self.clock.now();
        self.state
            .lock()
            .await
            .counters
            .insert(identity.clone(), UsageCounter::restore(now, hourly_count, daily_count));
    }

    /// Number of open quota sessions.
    pub async fn open_sessions(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    fn window_for(state: &mut State, identity: &Identity, limits: RateLimits, clock: &dyn Clock) -> RateLimitWindow {
        let now = clock.now();
        let counter = state
            .counters
            .entry(identity.clone())
            .or_insert_with(|| UsageCounter::new(now));
        counter.refresh(now);
        counter.window(identity, limits)
    }
}

impl std::fmt::Debug for InMemoryRateLimitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRateLimitService")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimitService for InMemoryRateLimitService {
    async fn check_conversation_limits(
        &self,
        identity: &Identity,
    ) -> Result<RateLimitWindow, RateLimitError> {
        let mut state = self.state.lock().await;
        Ok(Self::window_for(&mut state, identity, self.limits, self.clock.as_ref()))
    }

    async fn start_conversation(
        &self,
        _domain: ChatDomain,
        identity: &Identity,
    ) -> Result<StartedConversation, RateLimitError> {
        let mut state = self.state.lock().await;
        let limits = Self::window_for(&mut state, identity, self.limits, self.clock.as_ref());
        if !limits.allowed() {
            return Ok(StartedConversation {
                allowed: false,
                session_id: None,
                limits,
            });
        }

        let session_id = RateLimitSessionId::new();
        state.sessions.insert(session_id, identity.clone());
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
        let mut state = self.state.lock().await;
        let identity = state
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(RateLimitError::UnknownSession(session_id))?;

        let now = self.clock.now();
        let counter = state
            .counters
            .entry(identity.clone())
            .or_insert_with(|| UsageCounter::new(now));
        let accepted = counter.try_record(now, self.limits);
        let window = counter.window(&identity, self.limits);

        Ok(if accepted {
            MessageCountUpdate::Accepted(window)
        } else {
            MessageCountUpdate::Rejected(window)
        })
    }

    async fn end_conversation(&self, session_id: RateLimitSessionId) -> Result<(), RateLimitError> {
        self.state.lock().await.sessions.remove(&session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ManualClock;

    // 2024-01-15T10:00:00Z
    const TEN_AM: u64 = 1_705_312_800;

    fn identity() -> Identity {
        Identity::email("a@x.com").unwrap()
    }

    fn service(hourly: u32, daily: u32) -> (InMemoryRateLimitService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_unix_secs(TEN_AM));
        (
            InMemoryRateLimitService::with_clock(RateLimits::new(hourly, daily), clock.clone()),
            clock,
        )
    }

    #[tokio::test]
    async fn fresh_identity_is_allowed() {
        let (service, _) = service(2, 10);
        let window = service.check_conversation_limits(&identity()).await.unwrap();
        assert!(window.allowed());
        assert_eq!(window.hourly_count, 0);
    }

    #[tokio::test]
    async fn identity_at_hourly_limit_is_denied() {
        let (service, _) = service(2, 100);
        service.seed_usage(&identity(), 2, 2).await;

        let window = service.check_conversation_limits(&identity()).await.unwrap();

        assert!(!window.allowed());
        let started = service
            .start_conversation(ChatDomain::Technology, &identity())
            .await
            .unwrap();
        assert!(!started.allowed);
        assert!(started.session_id.is_none());
    }

    #[tokio::test]
    async fn messages_count_until_limit_then_reject() {
        let (service, _) = service(2, 100);
        let started = service
            .start_conversation(ChatDomain::Technology, &identity())
            .await
            .unwrap();
        let session = started.session_id.unwrap();

        assert!(service.update_message_count(session).await.unwrap().is_accepted());
        assert!(service.update_message_count(session).await.unwrap().is_accepted());
        let third = service.update_message_count(session).await.unwrap();

        assert!(!third.is_accepted());
        assert_eq!(third.window().hourly_count, 2);
    }

    #[tokio::test]
    async fn hourly_window_rolls_over_lazily() {
        let (service, clock) = service(1, 100);
        let session = service
            .start_conversation(ChatDomain::Technology, &identity())
            .await
            .unwrap()
            .session_id
            .unwrap();
        assert!(service.update_message_count(session).await.unwrap().is_accepted());
        assert!(!service.update_message_count(session).await.unwrap().is_accepted());

        clock.advance_secs(3_600);

        let update = service.update_message_count(session).await.unwrap();
        assert!(update.is_accepted());
        assert_eq!(update.window().daily_count, 2);
    }

    #[tokio::test]
    async fn counts_are_shared_across_sessions_for_one_identity() {
        let (service, _) = service(3, 100);
        let a = service
            .start_conversation(ChatDomain::Technology, &identity())
            .await
            .unwrap()
            .session_id
            .unwrap();
        let b = service
            .start_conversation(ChatDomain::Healthcare, &identity())
            .await
            .unwrap()
            .session_id
            .unwrap();

        service.update_message_count(a).await.unwrap();
        let update = service.update_message_count(b).await.unwrap();

        assert_eq!(update.window().hourly_count, 2);
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let (service, _) = service(3, 100);
        let err = service
            .update_message_count(RateLimitSessionId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RateLimitError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn end_conversation_closes_session_but_keeps_counts() {
        let (service, _) = service(3, 100);
        let session = service
            .start_conversation(ChatDomain::Technology, &identity())
            .await
            .unwrap()
            .session_id
            .unwrap();
        service.update_message_count(session).await.unwrap();

        service.end_conversation(session).await.unwrap();

        assert_eq!(service.open_sessions().await, 0);
        let window = service.check_conversation_limits(&identity()).await.unwrap();
        assert_eq!(window.hourly_count, 1);
    }
}
