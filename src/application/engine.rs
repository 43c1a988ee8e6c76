//! ChatEngine - the orchestration facade for one chat session.
//!
//! A send runs: re-entrancy guard, quota gate, conversation start (first
//! message), optimistic message count, user message append, then context
//! detection alongside dispatch. Nothing on this path ends the session;
//! provider, quota and persistence problems come back as outcomes and
//! events.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::configuration_store::{ConfigUpdate, ConfigurationStore};
use super::dispatch::{DispatchCoordinator, DispatchPlan, RequestSettings, TurnOutcome, DEFAULT_HISTORY_LIMIT};
use super::errors::ChatError;
use super::rate_limiter::{MessageAdmission, RateLimiter};
use crate::domain::context::{ContextDetectionError, ContextDetector, ContextShift, ShiftTracker};
use crate::domain::conversation::{Conversation, ConversationState, Message};
use crate::domain::enhancement::{PersonalityPicker, ResponseEnhancer};
use crate::domain::events::{ChatEvent, FailureCategory};
use crate::domain::foundation::{ChatDomain, Clock, ConversationId, Identity, SessionId, TurnId};
use crate::domain::rate_limit::RateLimitWindow;
use crate::domain::routing::ModelRouter;
use crate::domain::settings::{AIConfig, AIConfigPatch};
use crate::ports::{
    AccessRequest, ConversationLog, ConversationStart, EscalationDesk, EscalationTicket,
    EventPublisher, ImageAttachment, ModelProvider, Notification, Notifier, RateLimitService,
    SessionStorage, TicketAck,
};

/// Default number of recent messages attached to an escalation ticket.
pub const DEFAULT_ESCALATION_TRANSCRIPT_LEN: usize = 20;

/// Default chance of a personality starter on a reply.
pub const DEFAULT_PERSONALITY_PROBABILITY: f64 = 0.25;

/// Ports the engine talks to.
#[derive(Clone)]
pub struct ChatEngineDeps {
    pub provider: Arc<dyn ModelProvider>,
    pub rate_limits: Arc<dyn RateLimitService>,
    pub conversation_log: Arc<dyn ConversationLog>,
    pub notifier: Arc<dyn Notifier>,
    pub escalation: Arc<dyn EscalationDesk>,
    pub session_storage: Arc<dyn SessionStorage>,
    pub events: Arc<dyn EventPublisher>,
    pub detector: Arc<dyn ContextDetector>,
    pub clock: Arc<dyn Clock>,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub initial_config: AIConfig,
    pub initial_domain: ChatDomain,
    pub router: ModelRouter,
    pub request: RequestSettings,
    pub history_limit: usize,
    pub escalation_transcript_len: usize,
    /// Fixed seed for the personality starter; entropy when `None`.
    pub personality_seed: Option<u64>,
    pub personality_probability: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initial_config: AIConfig::default(),
            initial_domain: ChatDomain::default(),
            router: ModelRouter::default(),
            request: RequestSettings::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            escalation_transcript_len: DEFAULT_ESCALATION_TRANSCRIPT_LEN,
            personality_seed: None,
            personality_probability: DEFAULT_PERSONALITY_PROBABILITY,
        }
    }
}

/// What happened to a `send`.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Another send was in flight; nothing was recorded or dispatched.
    Dropped,
    /// Over quota; nothing was dispatched.
    QuotaExceeded {
        window: Option<RateLimitWindow>,
        retry_after_secs: u64,
    },
    Completed(TurnOutcome),
    /// The session was reset while the turn was in flight.
    Discarded,
}

/// Contact details for a human escalation.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Mutable per-session state, guarded by one lock that is never held
/// across a provider call.
#[derive(Debug)]
struct SessionState {
    session_id: SessionId,
    identity: Identity,
    domain: ChatDomain,
    record: Option<Conversation>,
    tracker: ShiftTracker,
    config: ConfigurationStore,
}

impl SessionState {
    /// Quota identity: the open conversation's, else the session's.
    fn active_identity(&self) -> Identity {
        match &self.record {
            Some(record) if record.active => record.identity.clone(),
            _ => self.identity.clone(),
        }
    }

    fn has_active_conversation(&self) -> bool {
        self.record.as_ref().is_some_and(|r| r.active)
    }
}

/// Clears the in-flight flag when the send finishes, however it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One chat session's orchestration engine.
pub struct ChatEngine {
    deps: ChatEngineDeps,
    settings: EngineSettings,
    limiter: RateLimiter,
    dispatcher: DispatchCoordinator,
    session: Mutex<SessionState>,
    conversation: Mutex<ConversationState>,
    in_flight: AtomicBool,
}

impl ChatEngine {
    pub fn new(
        deps: ChatEngineDeps,
        settings: EngineSettings,
        session_id: SessionId,
        identity: Identity,
    ) -> Self {
        let config = ConfigurationStore::new(
            session_id,
            settings.initial_config.clone(),
            deps.session_storage.clone(),
        );
        Self::assemble(deps, settings, session_id, identity, config)
    }

    /// Like `new`, but picks up a config saved earlier for `session_id`.
    pub async fn restore(
        deps: ChatEngineDeps,
        settings: EngineSettings,
        session_id: SessionId,
        identity: Identity,
    ) -> Self {
        let config = ConfigurationStore::restore(
            session_id,
            settings.initial_config.clone(),
            deps.session_storage.clone(),
        )
        .await;
        Self::assemble(deps, settings, session_id, identity, config)
    }

    fn assemble(
        deps: ChatEngineDeps,
        settings: EngineSettings,
        session_id: SessionId,
        identity: Identity,
        config: ConfigurationStore,
    ) -> Self {
        let enhancer = ResponseEnhancer::new(PersonalityPicker::new(
            settings.personality_seed,
            settings.personality_probability,
        ));
        let dispatcher = DispatchCoordinator::new(
            deps.provider.clone(),
            settings.router,
            enhancer,
            deps.events.clone(),
            deps.clock.clone(),
        )
        .with_settings(settings.request);

        Self {
            limiter: RateLimiter::new(deps.rate_limits.clone()),
            dispatcher,
            session: Mutex::new(SessionState {
                session_id,
                identity,
                domain: settings.initial_domain,
                record: None,
                tracker: ShiftTracker::new(),
                config,
            }),
            conversation: Mutex::new(ConversationState::new()),
            in_flight: AtomicBool::new(false),
            deps,
            settings,
        }
    }

    /// Sends one user message (text and/or images).
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` when there is nothing to send.
    pub async fn send(
        &self,
        text: &str,
        images: Vec<ImageAttachment>,
    ) -> Result<SendOutcome, ChatError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Send ignored while a turn is in flight");
            return Ok(SendOutcome::Dropped);
        };

        let prompt = text.trim();
        if prompt.is_empty() && images.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut session = self.session.lock().await;
        let identity = session.active_identity();

        let check = self.limiter.check_limits(&identity).await;
        if !check.allowed {
            return Ok(self.quota_exceeded(identity, check.window).await);
        }

        if !session.has_active_conversation() {
            let admission = self.limiter.start_conversation(session.domain, &identity).await;
            if !admission.allowed {
                return Ok(self.quota_exceeded(identity, admission.window).await);
            }
            let mut record = Conversation::start(identity.clone(), session.domain, self.deps.clock.now());
            record.log_id = self.open_log(&identity, session.domain).await;
            tracing::info!(conversation_id = %record.id, domain = %record.domain, "Conversation started");
            session.record = Some(record);
        }

        let admission = self.limiter.record_message(session.domain, &identity).await;
        if let MessageAdmission::Rejected(window) = admission {
            return Ok(self.quota_exceeded(identity, Some(window)).await);
        }

        let domain = session.domain;
        let config = session.config.config().clone();
        let user_message = Message::user(prompt, self.deps.clock.now());

        let (plan, transcript) = {
            let mut state = self.conversation.lock().await;
            let plan = DispatchPlan::build(
                TurnId::new(),
                session.session_id,
                prompt,
                images,
                domain,
                &config,
                self.dispatcher.router(),
                &state,
                self.settings.history_limit,
            );
            state.append(user_message.clone());
            (plan, state.user_transcript())
        };

        let topic = self.deps.detector.topic_hint(&transcript, domain);
        let suggestion = self
            .deps
            .detector
            .should_show_suggestion(&transcript, domain, &topic)
            .map(|s| s.text);
        let plan = plan.with_suggestion(suggestion);
        let window = session.tracker.window(&transcript).to_vec();

        let log_id = session.record.as_mut().and_then(|record| {
            record.record_message();
            record.log_id
        });
        self.log_message(log_id, &user_message).await;
        drop(session);

        let (shift, outcome) = tokio::join!(
            self.deps.detector.detect_context_shift(&window, domain),
            self.dispatcher.dispatch(&plan, &self.conversation),
        );

        if outcome.is_discarded() || self.conversation.lock().await.generation() != plan.generation {
            tracing::info!(turn_id = %plan.turn_id, "Turn discarded after reset");
            return Ok(SendOutcome::Discarded);
        }

        self.apply_shift(shift, domain, transcript.len(), plan.generation).await;

        for reply in outcome.replies() {
            self.log_message(log_id, reply).await;
        }
        self.publish_turn(&plan, &outcome).await;

        Ok(SendOutcome::Completed(outcome))
    }

    /// Ends the conversation and discards session state. Results of a turn
    /// still in flight are dropped when they settle.
    pub async fn reset(&self) {
        // Session first: a send still holding it finishes building its plan
        // on the old generation and is discarded when it settles.
        let mut session = self.session.lock().await;
        let (transcript, record): (Vec<Message>, _) = {
            let mut state = self.conversation.lock().await;
            let merged = state.merged_view().into_iter().cloned().collect();
            state.reset();
            (merged, session.record.take())
        };

        if let Some(mut record) = record {
            record.end();
            self.limiter.end_conversation(&record.identity).await;

            if let Some(log_id) = record.log_id {
                if let Err(e) = self.deps.conversation_log.end_conversation(log_id).await {
                    self.degraded("end_conversation", e.to_string()).await;
                }
            }

            if let Some(email) = record.identity.email_address() {
                if !transcript.is_empty() {
                    self.spawn_notification(Notification::Transcript {
                        email: email.to_string(),
                        domain: record.domain,
                        messages: transcript,
                    });
                }
            }
            tracing::info!(conversation_id = %record.id, messages = record.message_count, "Conversation ended");
        }
        session.tracker.reset();
        session.config.reset().await;
    }

    /// Records the visitor's email after the privacy notice is accepted and
    /// sends the welcome notification. Applies from the next conversation.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` for a malformed address.
    pub async fn accept_privacy(&self, email: &str) -> Result<(), ChatError> {
        let identity = Identity::email(email)?;
        let address = identity.email_address().unwrap_or(email).to_string();
        self.session.lock().await.identity = identity;
        self.spawn_notification(Notification::Welcome { email: address });
        Ok(())
    }

    /// Manually selects the domain. Detection starts over from here.
    pub async fn select_domain(&self, domain: ChatDomain) {
        let mut session = self.session.lock().await;
        session.domain = domain;
        let log_id = session.record.as_mut().and_then(|record| {
            record.switch_domain(domain);
            record.log_id
        });
        let transcript_len = self.conversation.lock().await.user_message_count();
        session.tracker.accept_shift(transcript_len);
        self.log_domain(log_id, domain).await;
    }

    /// Applies a config change; clears split lanes when the change requires.
    pub async fn update_config(&self, patch: AIConfigPatch) -> ConfigUpdate {
        let update = self.session.lock().await.config.update(patch).await;

        if update.lanes_cleared {
            self.conversation.lock().await.clear_lanes();
        }
        if update.lanes_cleared || !update.notices.is_empty() {
            self.publish(ChatEvent::ConfigChanged {
                notices: update.notices.clone(),
                lanes_cleared: update.lanes_cleared,
            })
            .await;
        }
        update
    }

    /// Hands the conversation to a human.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Escalation` when the desk refuses the ticket.
    pub async fn escalate(&self, request: EscalationRequest) -> Result<TicketAck, ChatError> {
        let transcript = self
            .conversation
            .lock()
            .await
            .last_n(self.settings.escalation_transcript_len);

        let ack = self
            .deps
            .escalation
            .submit(EscalationTicket {
                name: request.name,
                email: request.email,
                subject: request.subject,
                message: request.message,
                transcript,
            })
            .await?;

        self.publish(ChatEvent::EscalationSubmitted {
            ticket_id: ack.ticket_id,
            submitted_at: ack.submitted_at,
        })
        .await;
        Ok(ack)
    }

    /// Asks for a higher quota after hitting a limit.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Escalation` when the desk refuses the request.
    pub async fn request_extended_access(&self, reason: &str) -> Result<TicketAck, ChatError> {
        let identity = self.session.lock().await.active_identity();
        let window = self.limiter.check_limits(&identity).await.window;
        let ack = self
            .deps
            .escalation
            .request_extended_access(AccessRequest {
                identity,
                reason: reason.to_string(),
                window,
            })
            .await?;
        Ok(ack)
    }

    // === Read access ===

    pub async fn config(&self) -> AIConfig {
        self.session.lock().await.config.config().clone()
    }

    pub async fn domain(&self) -> ChatDomain {
        self.session.lock().await.domain
    }

    pub async fn identity(&self) -> Identity {
        self.session.lock().await.identity.clone()
    }

    pub async fn conversation(&self) -> ConversationState {
        self.conversation.lock().await.clone()
    }

    pub async fn active_conversation(&self) -> Option<Conversation> {
        self.session.lock().await.record.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // === Internals ===

    async fn quota_exceeded(&self, identity: Identity, window: Option<RateLimitWindow>) -> SendOutcome {
        let now = self.deps.clock.now();
        let retry_after_secs = window.as_ref().map_or(0, |w| w.retry_after_secs(&now));
        tracing::info!(identity = %identity.redacted(), retry_after_secs, "Message blocked by quota");

        self.publish(ChatEvent::RateLimited {
            identity,
            window: window.clone(),
            retry_after_secs,
        })
        .await;
        SendOutcome::QuotaExceeded {
            window,
            retry_after_secs,
        }
    }

    async fn open_log(&self, identity: &Identity, domain: ChatDomain) -> Option<ConversationId> {
        let ip: Option<IpAddr> = match identity {
            Identity::Anonymous(ip) => Some(*ip),
            Identity::Email(_) => None,
        };
        let start = ConversationStart {
            identity: identity.clone(),
            domain,
            ip,
        };
        match self.deps.conversation_log.start_conversation(start).await {
            Ok(id) => Some(id),
            Err(e) => {
                self.degraded("start_conversation", e.to_string()).await;
                None
            }
        }
    }

    async fn log_message(&self, log_id: Option<ConversationId>, message: &Message) {
        let Some(log_id) = log_id else {
            return;
        };
        if let Err(e) = self.deps.conversation_log.append_message(log_id, message).await {
            self.degraded("append_message", e.to_string()).await;
        }
    }

    async fn log_domain(&self, log_id: Option<ConversationId>, domain: ChatDomain) {
        let Some(log_id) = log_id else {
            return;
        };
        if let Err(e) = self.deps.conversation_log.switch_domain(log_id, domain).await {
            self.degraded("switch_domain", e.to_string()).await;
        }
    }

    async fn apply_shift(
        &self,
        shift: Result<ContextShift, ContextDetectionError>,
        from: ChatDomain,
        transcript_len: usize,
        generation: u64,
    ) {
        let shift = match shift {
            Ok(shift) => shift,
            Err(e) => {
                tracing::warn!(error = %e, "Context detection failed, keeping domain");
                return;
            }
        };
        let Some(to) = shift.new_domain.filter(|_| shift.shifted) else {
            return;
        };

        {
            let mut session = self.session.lock().await;
            if self.conversation.lock().await.generation() != generation || session.domain != from {
                return;
            }
            session.domain = to;
            let log_id = session.record.as_mut().and_then(|record| {
                record.switch_domain(to);
                record.log_id
            });
            session.tracker.accept_shift(transcript_len);
            self.log_domain(log_id, to).await;
        }

        tracing::info!(%from, %to, confidence = shift.confidence, "Context shifted");
        self.publish(ChatEvent::ContextShifted {
            from,
            to,
            confidence: shift.confidence,
        })
        .await;
    }

    async fn publish_turn(&self, plan: &DispatchPlan, outcome: &TurnOutcome) {
        self.publish(ChatEvent::TurnCompleted {
            turn_id: plan.turn_id,
            succeeded: outcome.succeeded(),
            failed: outcome.failed(),
        })
        .await;

        if !outcome.all_failed() {
            return;
        }
        let message = if plan.is_split() {
            "Neither model could answer. You can try again or ask for a human.".to_string()
        } else {
            outcome
                .results()
                .iter()
                .find_map(|r| r.error())
                .map(ToString::to_string)
                .unwrap_or_default()
        };
        self.publish(ChatEvent::TurnFailed {
            turn_id: plan.turn_id,
            category: outcome.failure_category().unwrap_or(FailureCategory::Generic),
            message,
            escalation_offered: true,
        })
        .await;
    }

    async fn degraded(&self, operation: &str, reason: String) {
        tracing::warn!(operation, reason = %reason, "Conversation log write failed");
        self.publish(ChatEvent::PersistenceDegraded {
            operation: operation.to_string(),
            reason,
        })
        .await;
    }

    fn spawn_notification(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = self.deps.notifier.clone();
        let events = self.deps.events.clone();
        tokio::spawn(async move {
            let kind = notification.kind();
            if let Err(e) = notifier.notify(notification).await {
                tracing::warn!(kind, error = %e, "Notification failed");
                let event = ChatEvent::NotificationFailed {
                    notification: kind.to_string(),
                    reason: e.to_string(),
                };
                if let Err(e) = events.publish(event).await {
                    tracing::warn!(error = %e, "Failed to publish notification failure");
                }
            }
        })
    }

    async fn publish(&self, event: ChatEvent) {
        if let Err(e) = self.deps.events.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish chat event");
        }
    }
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("settings", &self.settings)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = InFlightGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn default_settings_use_documented_values() {
        let settings = EngineSettings::default();
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(settings.escalation_transcript_len, DEFAULT_ESCALATION_TRANSCRIPT_LEN);
        assert!(settings.personality_seed.is_none());
    }
}
