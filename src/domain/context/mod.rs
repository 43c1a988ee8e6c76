//! Context module - detects when the conversation moves between the preset
//! domains and offers milestone follow-ups.

mod classifier;
mod errors;
mod tracker;
mod vocabulary;

pub use classifier::{
    ContextDetector, ContextShift, KeywordContextClassifier, Suggestion, DEFAULT_MILESTONES,
    DEFAULT_SHIFT_THRESHOLD,
};
pub use errors::ContextDetectionError;
pub use tracker::ShiftTracker;
pub use vocabulary::keywords;
