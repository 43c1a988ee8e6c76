//! Conversation module - messages, split-screen lanes and the active
//! conversation record.

mod message;
mod metadata;
mod record;
mod state;

pub use message::{Lane, Message, MessageRole};
pub use metadata::{
    CollaborationInfo, Complexity, CostLatencyEstimate, DisplayFormat, EmotionalTone,
    MessageMetadata, TriageResult, Urgency,
};
pub use record::Conversation;
pub use state::{ConversationState, LaneLog, LaneStatus, SplitLanes};
