//! Application layer - services that orchestrate the domain over the ports.
//!
//! - `RateLimiter` - fail-open quota gate
//! - `ConfigurationStore` - session `AIConfig` with persistence
//! - `DispatchCoordinator` - single and split-screen model dispatch
//! - `ChatEngine` - the per-session facade

mod configuration_store;
mod dispatch;
mod engine;
mod errors;
mod rate_limiter;

pub use configuration_store::{ConfigUpdate, ConfigurationStore};
pub use dispatch::{
    DispatchCoordinator, DispatchPlan, LaneResult, LaneTarget, RequestSettings, TurnOutcome,
    DEFAULT_HISTORY_LIMIT,
};
pub use engine::{
    ChatEngine, ChatEngineDeps, EngineSettings, EscalationRequest, SendOutcome,
    DEFAULT_ESCALATION_TRANSCRIPT_LEN, DEFAULT_PERSONALITY_PROBABILITY,
};
pub use errors::ChatError;
pub use rate_limiter::{ConversationAdmission, LimitCheck, MessageAdmission, RateLimiter};
