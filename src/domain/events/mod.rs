//! Events module - typed notifications the engine emits for a presentation
//! layer to react to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::{Lane, LaneStatus};
use crate::domain::foundation::{ChatDomain, Identity, TicketId, Timestamp, TurnId};
use crate::domain::rate_limit::RateLimitWindow;
use crate::domain::settings::ConfigNotice;

/// Toast category for a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Payment,
    RateLimit,
    Generic,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCategory::Payment => "payment",
            FailureCategory::RateLimit => "rate_limit",
            FailureCategory::Generic => "generic",
        };
        write!(f, "{}", s)
    }
}

/// Something the orchestration engine wants the outside world to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    RateLimited {
        identity: Identity,
        window: Option<RateLimitWindow>,
        retry_after_secs: u64,
    },
    ContextShifted {
        from: ChatDomain,
        to: ChatDomain,
        confidence: f64,
    },
    LaneUpdated {
        turn_id: TurnId,
        lane: Lane,
        status: LaneStatus,
    },
    TurnCompleted {
        turn_id: TurnId,
        succeeded: usize,
        failed: usize,
    },
    TurnFailed {
        turn_id: TurnId,
        category: FailureCategory,
        message: String,
        escalation_offered: bool,
    },
    ConfigChanged {
        notices: Vec<ConfigNotice>,
        lanes_cleared: bool,
    },
    PersistenceDegraded {
        operation: String,
        reason: String,
    },
    NotificationFailed {
        notification: String,
        reason: String,
    },
    EscalationSubmitted {
        ticket_id: TicketId,
        submitted_at: Timestamp,
    },
}

impl ChatEvent {
    /// Versioned routing key, e.g. `chat.turn_completed.v1`.
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::RateLimited { .. } => "chat.rate_limited.v1",
            ChatEvent::ContextShifted { .. } => "chat.context_shifted.v1",
            ChatEvent::LaneUpdated { .. } => "chat.lane_updated.v1",
            ChatEvent::TurnCompleted { .. } => "chat.turn_completed.v1",
            ChatEvent::TurnFailed { .. } => "chat.turn_failed.v1",
            ChatEvent::ConfigChanged { .. } => "chat.config_changed.v1",
            ChatEvent::PersistenceDegraded { .. } => "chat.persistence_degraded.v1",
            ChatEvent::NotificationFailed { .. } => "chat.notification_failed.v1",
            ChatEvent::EscalationSubmitted { .. } => "chat.escalation_submitted.v1",
        }
    }
}
