//! Domain-shift detection and milestone suggestions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ChatDomain;

use super::errors::ContextDetectionError;
use super::vocabulary::{count_matches, last_keyword, normalize};

/// Confidence that must be exceeded before the domain switches.
pub const DEFAULT_SHIFT_THRESHOLD: f64 = 0.6;

/// User-message counts at which a follow-up suggestion is offered.
pub const DEFAULT_MILESTONES: [usize; 3] = [3, 5, 7];

/// Result of a shift check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextShift {
    pub shifted: bool,
    pub new_domain: Option<ChatDomain>,
    pub confidence: f64,
}

impl ContextShift {
    pub fn none(confidence: f64) -> Self {
        Self {
            shifted: false,
            new_domain: None,
            confidence,
        }
    }
}

/// A follow-up prompt offered at a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub milestone: usize,
    pub text: String,
}

/// Detects when the user's intent has moved to another domain.
#[async_trait]
pub trait ContextDetector: Send + Sync {
    /// Checks whether `transcript` (user messages, oldest first) has moved
    /// away from `current`.
    ///
    /// # Errors
    ///
    /// Returns `ContextDetectionError` when the detector cannot decide.
    async fn detect_context_shift(
        &self,
        transcript: &[String],
        current: ChatDomain,
    ) -> Result<ContextShift, ContextDetectionError>;

    /// Follow-up suggestion when the user-message count hits a milestone.
    fn should_show_suggestion(
        &self,
        transcript: &[String],
        current: ChatDomain,
        topic: &str,
    ) -> Option<Suggestion>;

    /// Topic hint for suggestions: the latest domain keyword seen, else the
    /// domain label.
    fn topic_hint(&self, transcript: &[String], current: ChatDomain) -> String;
}

/// Keyword-presence classifier over the two preset vocabularies.
///
/// Each distinct keyword present in the transcript scores one point; the
/// latest message's keywords score again so fresh intent outweighs stale
/// context.
#[derive(Debug, Clone)]
pub struct KeywordContextClassifier {
    threshold: f64,
    milestones: Vec<usize>,
}

impl KeywordContextClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            milestones: DEFAULT_MILESTONES.to_vec(),
        }
    }

    pub fn with_milestones(mut self, milestones: Vec<usize>) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Weighted keyword score of `domain` over the transcript.
    pub fn score(&self, transcript: &[String], domain: ChatDomain) -> usize {
        let all = normalize(&transcript.join(" "));
        let recent = transcript
            .last()
            .map(|m| count_matches(&normalize(m), domain))
            .unwrap_or(0);
        count_matches(&all, domain) + recent
    }

    /// Synchronous core of `detect_context_shift`.
    pub fn evaluate(&self, transcript: &[String], current: ChatDomain) -> ContextShift {
        let tech = self.score(transcript, ChatDomain::Technology);
        let health = self.score(transcript, ChatDomain::Healthcare);
        let total = tech + health;
        if total == 0 {
            return ContextShift::none(0.0);
        }

        let (dominant, dominant_score) = if health > tech {
            (ChatDomain::Healthcare, health)
        } else {
            (ChatDomain::Technology, tech)
        };
        let confidence = dominant_score as f64 / total as f64;

        if dominant != current && confidence > self.threshold {
            ContextShift {
                shifted: true,
                new_domain: Some(dominant),
                confidence,
            }
        } else {
            ContextShift::none(confidence)
        }
    }

    fn suggestion_text(milestone_index: usize, domain: ChatDomain, topic: &str) -> String {
        match (domain, milestone_index) {
            (ChatDomain::Technology, 0) => {
                format!("Would you like a quick comparison of tools that handle {}?", topic)
            }
            (ChatDomain::Technology, 1) => {
                format!("Want me to sketch an implementation plan for {}?", topic)
            }
            (ChatDomain::Technology, _) => {
                format!("Shall I put together a checklist of next steps for {}?", topic)
            }
            (ChatDomain::Healthcare, 0) => format!(
                "Would you like a plain-language summary of what we've covered about {}?",
                topic
            ),
            (ChatDomain::Healthcare, 1) => format!(
                "Want a list of questions to bring to your care team about {}?",
                topic
            ),
            (ChatDomain::Healthcare, _) => {
                format!("Shall I point you to reputable reading on {}?", topic)
            }
        }
    }
}

impl Default for KeywordContextClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SHIFT_THRESHOLD)
    }
}

#[async_trait]
impl ContextDetector for KeywordContextClassifier {
    async fn detect_context_shift(
        &self,
        transcript: &[String],
        current: ChatDomain,
    ) -> Result<ContextShift, ContextDetectionError> {
        Ok(self.evaluate(transcript, current))
    }

    fn should_show_suggestion(
        &self,
        transcript: &[String],
        current: ChatDomain,
        topic: &str,
    ) -> Option<Suggestion> {
        let count = transcript.len();
        let index = self.milestones.iter().position(|m| *m == count)?;
        Some(Suggestion {
            milestone: count,
            text: Self::suggestion_text(index, current, topic),
        })
    }

    fn topic_hint(&self, transcript: &[String], current: ChatDomain) -> String {
        transcript
            .iter()
            .rev()
            .find_map(|m| last_keyword(&normalize(m), current))
            .unwrap_or_else(|| current.as_str())
            .to_string()
    }
}
