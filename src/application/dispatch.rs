//! DispatchCoordinator - sends one turn to one or two models.
//!
//! Single mode issues one request whose reply goes to the main log. Split
//! mode issues two requests concurrently and joins them all-settled: each
//! lane is enhanced and appended the moment it settles, a failure in one
//! lane never aborts the other, and results that settle after a reset are
//! dropped.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;

use crate::domain::conversation::{ConversationState, Lane, LaneStatus, Message};
use crate::domain::enhancement::{EnhancementContext, ResponseEnhancer};
use crate::domain::events::{ChatEvent, FailureCategory};
use crate::domain::foundation::{ChatDomain, Clock, SessionId, TurnId};
use crate::domain::routing::ModelRouter;
use crate::domain::settings::{AIConfig, TurnFeatures};
use crate::ports::{
    AIError, EventPublisher, HistoryMessage, ImageAttachment, ModelProvider, ModelRequest,
    ProviderReply, RequestMetadata,
};

/// Default number of prior messages sent with each request.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Sampling settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// One model call within a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneTarget {
    /// `None` in single mode.
    pub lane: Option<Lane>,
    pub model: String,
    /// Prior messages for this lane, oldest first.
    pub history: Vec<Message>,
}

/// Everything needed to dispatch one turn, captured before the user
/// message is appended.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub turn_id: TurnId,
    pub session_id: SessionId,
    /// Conversation generation the plan was built for.
    pub generation: u64,
    pub prompt: String,
    pub images: Vec<ImageAttachment>,
    pub domain: ChatDomain,
    pub features: TurnFeatures,
    pub auto_route: bool,
    /// Milestone follow-up appended by the enhancer.
    pub suggestion: Option<String>,
    pub targets: Vec<LaneTarget>,
}

impl DispatchPlan {
    /// Builds the plan for `config`: one target, or two in split mode.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        turn_id: TurnId,
        session_id: SessionId,
        prompt: impl Into<String>,
        images: Vec<ImageAttachment>,
        domain: ChatDomain,
        config: &AIConfig,
        router: &ModelRouter,
        state: &ConversationState,
        history_limit: usize,
    ) -> Self {
        let targets = if config.is_split() {
            vec![
                LaneTarget {
                    lane: Some(Lane::Primary),
                    model: config.primary_model.clone(),
                    history: state.history_for(Some(Lane::Primary), history_limit),
                },
                LaneTarget {
                    lane: Some(Lane::Secondary),
                    model: config.resolved_secondary_model(router),
                    history: state.history_for(Some(Lane::Secondary), history_limit),
                },
            ]
        } else {
            vec![LaneTarget {
                lane: None,
                model: config.primary_model.clone(),
                history: state.history_for(None, history_limit),
            }]
        };

        Self {
            turn_id,
            session_id,
            generation: state.generation(),
            prompt: prompt.into(),
            images,
            domain,
            features: config.features(),
            auto_route: config.auto_route(),
            suggestion: None,
            targets,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn is_split(&self) -> bool {
        self.targets.len() > 1
    }
}

/// How one lane settled.
#[derive(Debug, Clone, PartialEq)]
pub enum LaneResult {
    /// The enhanced reply, already appended to the conversation.
    Replied { lane: Option<Lane>, message: Message },
    Failed {
        lane: Option<Lane>,
        model: String,
        error: AIError,
    },
    /// Settled after a reset; nothing was appended.
    Discarded { lane: Option<Lane> },
}

impl LaneResult {
    pub fn lane(&self) -> Option<Lane> {
        match self {
            LaneResult::Replied { lane, .. }
            | LaneResult::Failed { lane, .. }
            | LaneResult::Discarded { lane } => *lane,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            LaneResult::Replied { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AIError> {
        match self {
            LaneResult::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Single(LaneResult),
    Split {
        primary: LaneResult,
        secondary: LaneResult,
    },
}

impl TurnOutcome {
    pub fn results(&self) -> Vec<&LaneResult> {
        match self {
            TurnOutcome::Single(result) => vec![result],
            TurnOutcome::Split { primary, secondary } => vec![primary, secondary],
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results().iter().filter(|r| r.message().is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.results().iter().filter(|r| r.error().is_some()).count()
    }

    /// Every lane settled after a reset.
    pub fn is_discarded(&self) -> bool {
        self.results()
            .iter()
            .all(|r| matches!(r, LaneResult::Discarded { .. }))
    }

    /// Every lane failed.
    pub fn all_failed(&self) -> bool {
        self.failed() == self.results().len()
    }

    /// Toast category of the first failure.
    pub fn failure_category(&self) -> Option<FailureCategory> {
        self.results()
            .iter()
            .find_map(|r| r.error())
            .map(AIError::failure_category)
    }

    pub fn replies(&self) -> Vec<&Message> {
        self.results().iter().filter_map(|r| r.message()).collect()
    }
}

/// Issues provider calls for a turn and folds the replies into the
/// conversation.
pub struct DispatchCoordinator {
    provider: Arc<dyn ModelProvider>,
    router: ModelRouter,
    enhancer: StdMutex<ResponseEnhancer>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    settings: RequestSettings,
}

impl DispatchCoordinator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        router: ModelRouter,
        enhancer: ResponseEnhancer,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            router,
            enhancer: StdMutex::new(enhancer),
            events,
            clock,
            settings: RequestSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RequestSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    /// Runs the plan to completion. Never aborts an issued call.
    pub async fn dispatch(
        &self,
        plan: &DispatchPlan,
        conversation: &Mutex<ConversationState>,
    ) -> TurnOutcome {
        tracing::info!(
            turn_id = %plan.turn_id,
            lanes = plan.targets.len(),
            domain = %plan.domain,
            "Dispatching turn"
        );

        if !plan.is_split() {
            let result = match plan.targets.first() {
                Some(target) => self.run_lane(plan, target, conversation).await,
                None => LaneResult::Discarded { lane: None },
            };
            return TurnOutcome::Single(result);
        }

        for target in &plan.targets {
            if let Some(lane) = target.lane {
                self.set_status(plan, lane, LaneStatus::Thinking, conversation).await;
            }
        }

        let mut pending: FuturesUnordered<_> = plan
            .targets
            .iter()
            .map(|target| self.run_lane(plan, target, conversation))
            .collect();

        let mut primary = LaneResult::Discarded {
            lane: Some(Lane::Primary),
        };
        let mut secondary = LaneResult::Discarded {
            lane: Some(Lane::Secondary),
        };
        while let Some(result) = pending.next().await {
            match result.lane() {
                Some(Lane::Secondary) => secondary = result,
                _ => primary = result,
            }
        }

        TurnOutcome::Split { primary, secondary }
    }

    async fn run_lane(
        &self,
        plan: &DispatchPlan,
        target: &LaneTarget,
        conversation: &Mutex<ConversationState>,
    ) -> LaneResult {
        let request = self.request_for(plan, target);
        let outcome = self.provider.complete(request).await.and_then(|reply| {
            if reply.content.trim().is_empty() {
                Err(AIError::EmptyReply {
                    model: reply.model_used,
                })
            } else {
                Ok(reply)
            }
        });

        // Lock only after the provider call has settled.
        let mut state = conversation.lock().await;
        if state.generation() != plan.generation {
            tracing::debug!(turn_id = %plan.turn_id, lane = ?target.lane, "Dropping result from a previous generation");
            return LaneResult::Discarded { lane: target.lane };
        }

        match outcome {
            Ok(reply) => {
                let message = self.build_reply(plan, target, reply);
                match target.lane {
                    Some(lane) => {
                        state.append_to_lane(lane, message.clone());
                        state.set_lane_status(lane, LaneStatus::Idle);
                    }
                    None => state.append(message.clone()),
                }
                drop(state);

                if let Some(lane) = target.lane {
                    self.publish_lane(plan, lane, LaneStatus::Idle).await;
                }
                LaneResult::Replied {
                    lane: target.lane,
                    message,
                }
            }
            Err(error) => {
                tracing::warn!(
                    turn_id = %plan.turn_id,
                    model = %target.model,
                    category = %error.failure_category(),
                    error = %error,
                    "Model call failed"
                );
                if let Some(lane) = target.lane {
                    let status = LaneStatus::Failed {
                        reason: error.to_string(),
                    };
                    state.set_lane_status(lane, status.clone());
                    drop(state);
                    self.publish_lane(plan, lane, status).await;
                }
                LaneResult::Failed {
                    lane: target.lane,
                    model: target.model.clone(),
                    error,
                }
            }
        }
    }

    fn request_for(&self, plan: &DispatchPlan, target: &LaneTarget) -> ModelRequest {
        ModelRequest::new(self.router.provider_for(&target.model), &target.model, &plan.prompt)
            .with_system_prompt(system_prompt(plan.domain))
            .with_history(target.history.iter().map(HistoryMessage::from).collect())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_features(plan.features)
            .with_images(plan.images.clone())
            .with_auto_route(plan.auto_route)
            .with_metadata(RequestMetadata {
                session_id: plan.session_id,
                turn_id: plan.turn_id,
                lane: target.lane,
                domain: plan.domain,
            })
    }

    fn build_reply(&self, plan: &DispatchPlan, target: &LaneTarget, reply: ProviderReply) -> Message {
        let context = EnhancementContext {
            model_used: reply.model_used.clone(),
            requested_model: Some(target.model.clone()),
            estimates: reply.estimates.clone(),
            suggestion: plan.suggestion.clone(),
            features: plan.features,
        };
        let content = self
            .enhancer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enhance(&reply.content, reply.triage.as_ref(), &context);

        let mut message = Message::assistant(content, self.clock.now())
            .with_model(reply.model_used.clone())
            .with_metadata(reply.metadata(&target.model));
        if let Some(lane) = target.lane {
            message = message.in_lane(lane);
        }
        message
    }

    async fn set_status(
        &self,
        plan: &DispatchPlan,
        lane: Lane,
        status: LaneStatus,
        conversation: &Mutex<ConversationState>,
    ) {
        {
            let mut state = conversation.lock().await;
            if state.generation() != plan.generation {
                return;
            }
            state.set_lane_status(lane, status.clone());
        }
        self.publish_lane(plan, lane, status).await;
    }

    async fn publish_lane(&self, plan: &DispatchPlan, lane: Lane, status: LaneStatus) {
        let event = ChatEvent::LaneUpdated {
            turn_id: plan.turn_id,
            lane,
            status,
        };
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish lane update");
        }
    }
}

impl std::fmt::Debug for DispatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCoordinator")
            .field("router", &self.router)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn system_prompt(domain: ChatDomain) -> String {
    match domain {
        ChatDomain::Technology => "You are a knowledgeable technology assistant. Answer clearly and \
             concisely, with code or steps where they help."
            .to_string(),
        ChatDomain::Healthcare => "You are a careful healthcare information assistant. Give general, \
             evidence-based information, never a diagnosis, and suggest consulting a professional \
             when symptoms are serious."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockModelProvider};
    use crate::adapters::events::InMemoryEventBus;
    use crate::domain::enhancement::PersonalityPicker;
    use crate::domain::foundation::{ManualClock, Timestamp};
    use crate::domain::settings::ChatMode;
    use std::time::Duration;

    struct Fixture {
        provider: Arc<MockModelProvider>,
        events: Arc<InMemoryEventBus>,
        coordinator: DispatchCoordinator,
    }

    fn fixture(provider: MockModelProvider) -> Fixture {
        let provider = Arc::new(provider);
        let events = Arc::new(InMemoryEventBus::new());
        let coordinator = DispatchCoordinator::new(
            provider.clone(),
            ModelRouter::default(),
            ResponseEnhancer::new(PersonalityPicker::disabled()),
            events.clone(),
            Arc::new(ManualClock::at_unix_secs(1_705_276_800)),
        );
        Fixture {
            provider,
            events,
            coordinator,
        }
    }

    fn split_config() -> AIConfig {
        let mut config = AIConfig::with_primary_model("gpt-4o");
        config.mode = ChatMode::Multi;
        config.split_screen = true;
        config
    }

    fn plan_for(config: &AIConfig, state: &ConversationState) -> DispatchPlan {
        DispatchPlan::build(
            TurnId::new(),
            SessionId::new(),
            "hello",
            vec![],
            ChatDomain::Technology,
            config,
            &ModelRouter::default(),
            state,
            DEFAULT_HISTORY_LIMIT,
        )
    }

    #[tokio::test]
    async fn single_mode_appends_reply_to_main_log() {
        let f = fixture(MockModelProvider::new().with_reply("gpt-4o", "Hi there"));
        let conversation = Mutex::new(ConversationState::new());
        let plan = plan_for(&AIConfig::with_primary_model("gpt-4o"), &*conversation.lock().await);

        let outcome = f.coordinator.dispatch(&plan, &conversation).await;

        assert_eq!(outcome.succeeded(), 1);
        let state = conversation.lock().await;
        assert_eq!(state.messages().len(), 1);
        assert!(state.messages()[0].content().starts_with("Hi there"));
        assert_eq!(f.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_reply_is_a_failure() {
        let f = fixture(MockModelProvider::new().with_reply("gpt-4o", "   "));
        let conversation = Mutex::new(ConversationState::new());
        let plan = plan_for(&AIConfig::with_primary_model("gpt-4o"), &*conversation.lock().await);

        let outcome = f.coordinator.dispatch(&plan, &conversation).await;

        assert!(outcome.all_failed());
        assert!(matches!(
            outcome.results()[0].error(),
            Some(AIError::EmptyReply { .. })
        ));
        assert!(conversation.lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn split_mode_targets_primary_and_complement() {
        let config = split_config();
        let plan = plan_for(&config, &ConversationState::new());

        assert!(plan.is_split());
        assert_eq!(plan.targets[0].model, "gpt-4o");
        assert_eq!(plan.targets[1].model, "claude-3-5-sonnet-latest");
    }

    #[tokio::test]
    async fn split_failure_in_one_lane_keeps_the_other() {
        let f = fixture(
            MockModelProvider::new()
                .with_error(
                    "gpt-4o",
                    MockError::Unavailable {
                        message: "down".into(),
                    },
                )
                .with_reply("claude-3-5-sonnet-latest", "Claude here"),
        );
        let conversation = Mutex::new(ConversationState::new());
        let plan = plan_for(&split_config(), &*conversation.lock().await);

        let outcome = f.coordinator.dispatch(&plan, &conversation).await;

        assert_eq!(outcome.succeeded(), 1);
        assert_eq!(outcome.failed(), 1);
        let state = conversation.lock().await;
        assert_eq!(state.lane(Lane::Secondary).messages().len(), 1);
        assert!(state.lane(Lane::Primary).messages().is_empty());
        assert!(matches!(state.lane(Lane::Primary).status(), LaneStatus::Failed { .. }));
        assert_eq!(state.lane(Lane::Secondary).status(), &LaneStatus::Idle);
    }

    #[tokio::test]
    async fn slow_lane_is_awaited_not_aborted() {
        let f = fixture(
            MockModelProvider::new()
                .with_model_delay("gpt-4o", Duration::from_millis(40))
                .with_reply("gpt-4o", "slow")
                .with_reply("claude-3-5-sonnet-latest", "fast"),
        );
        let conversation = Mutex::new(ConversationState::new());
        let plan = plan_for(&split_config(), &*conversation.lock().await);

        let outcome = f.coordinator.dispatch(&plan, &conversation).await;

        assert_eq!(outcome.succeeded(), 2);
        assert_eq!(f.provider.call_count(), 2);
    }

    #[tokio::test]
    async fn split_mode_broadcasts_lane_updates() {
        let f = fixture(MockModelProvider::new());
        let conversation = Mutex::new(ConversationState::new());
        let plan = plan_for(&split_config(), &*conversation.lock().await);

        f.coordinator.dispatch(&plan, &conversation).await;

        // Thinking then Idle for each lane.
        assert_eq!(f.events.events_of_type("chat.lane_updated.v1").len(), 4);
    }

    #[tokio::test]
    async fn results_after_reset_are_discarded() {
        let f = fixture(
            MockModelProvider::new().with_model_delay("gpt-4o", Duration::from_millis(50)),
        );
        let conversation = Arc::new(Mutex::new(ConversationState::new()));
        let plan = plan_for(&AIConfig::with_primary_model("gpt-4o"), &*conversation.lock().await);

        let resetter = {
            let conversation = conversation.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                conversation.lock().await.reset();
            }
        };
        let (outcome, _) = tokio::join!(f.coordinator.dispatch(&plan, &conversation), resetter);

        assert!(outcome.is_discarded());
        assert!(conversation.lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn history_excludes_the_current_prompt() {
        let f = fixture(MockModelProvider::new());
        let mut state = ConversationState::new();
        state.append(Message::user("earlier", Timestamp::from_unix_secs(1)));
        let plan = plan_for(&AIConfig::with_primary_model("gpt-4o"), &state);
        let conversation = Mutex::new(state);

        f.coordinator.dispatch(&plan, &conversation).await;

        let calls = f.provider.get_calls();
        assert_eq!(calls[0].history.len(), 1);
        assert_eq!(calls[0].prompt, "hello");
        assert!(calls[0].system_prompt.is_some());
    }
}
