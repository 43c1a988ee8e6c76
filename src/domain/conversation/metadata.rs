//! Provider-produced annotations attached to assistant messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Declares a lowercase-serialised enum with `as_str`, `Display` and a
/// validating `FromStr`.
macro_rules! triage_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    other => Err(ValidationError::unknown_variant($field, other)),
                }
            }
        }
    };
}

triage_enum!(
    /// How involved the question is.
    Complexity, "complexity" {
        Simple => "simple",
        Moderate => "moderate",
        Complex => "complex",
    }
);

triage_enum!(
    /// How time-sensitive the question is.
    Urgency, "urgency" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

triage_enum!(
    /// Preferred rendering of the answer.
    DisplayFormat, "display_format" {
        Text => "text",
        List => "list",
        Table => "table",
        Steps => "steps",
        Code => "code",
    }
);

triage_enum!(
    /// Detected emotional tone of the user's message.
    EmotionalTone, "emotional_tone" {
        Neutral => "neutral",
        Positive => "positive",
        Curious => "curious",
        Frustrated => "frustrated",
        Anxious => "anxious",
    }
);

/// Provider's classification of a user message. Read-only once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub complexity: Complexity,
    pub domain: String,
    pub urgency: Urgency,
    pub display_format: DisplayFormat,
    pub emotional_tone: EmotionalTone,
    pub vision_required: bool,
    confidence: f64,
    pub suggested_model: Option<String>,
}

impl TriageResult {
    /// Builds a triage result, rejecting confidence outside [0, 1].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        complexity: Complexity,
        domain: impl Into<String>,
        urgency: Urgency,
        display_format: DisplayFormat,
        emotional_tone: EmotionalTone,
        vision_required: bool,
        confidence: f64,
        suggested_model: Option<String>,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::out_of_range("confidence", 0.0, 1.0, confidence));
        }
        Ok(Self {
            complexity,
            domain: domain.into(),
            urgency,
            display_format,
            emotional_tone,
            vision_required,
            confidence,
            suggested_model,
        })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Low urgency with a relaxed tone leaves room for a light remark.
    pub fn is_relaxed(&self) -> bool {
        self.urgency == Urgency::Low
            && matches!(
                self.emotional_tone,
                EmotionalTone::Neutral | EmotionalTone::Positive | EmotionalTone::Curious
            )
    }
}

/// Cost and latency of the routed call, optionally against a baseline model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLatencyEstimate {
    pub cost_usd: f64,
    pub latency_ms: u64,
    pub baseline_cost_usd: Option<f64>,
    pub baseline_latency_ms: Option<u64>,
}

impl CostLatencyEstimate {
    /// Saved cost versus the baseline (negative when more expensive).
    pub fn cost_delta_usd(&self) -> Option<f64> {
        self.baseline_cost_usd.map(|baseline| baseline - self.cost_usd)
    }

    /// Saved latency versus the baseline (negative when slower).
    pub fn latency_delta_ms(&self) -> Option<i64> {
        self.baseline_latency_ms
            .map(|baseline| baseline as i64 - self.latency_ms as i64)
    }
}

/// Models that contributed to a collaborative answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationInfo {
    pub participating_models: Vec<String>,
    pub strategy: Option<String>,
}

/// Optional annotations on a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub triage: Option<TriageResult>,
    pub estimates: Option<CostLatencyEstimate>,
    pub collaboration: Option<CollaborationInfo>,
    pub requested_model: Option<String>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.triage.is_none()
            && self.estimates.is_none()
            && self.collaboration.is_none()
            && self.requested_model.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triage(urgency: Urgency, tone: EmotionalTone) -> TriageResult {
        TriageResult::new(
            Complexity::Simple,
            "technology",
            urgency,
            DisplayFormat::Text,
            tone,
            false,
            0.8,
            None,
        )
        .unwrap()
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        let result = TriageResult::new(
            Complexity::Simple,
            "technology",
            Urgency::Low,
            DisplayFormat::Text,
            EmotionalTone::Neutral,
            false,
            1.2,
            None,
        );
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn nan_confidence_is_rejected() {
        let result = TriageResult::new(
            Complexity::Simple,
            "x",
            Urgency::Low,
            DisplayFormat::Text,
            EmotionalTone::Neutral,
            false,
            f64::NAN,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn relaxed_requires_low_urgency_and_calm_tone() {
        assert!(triage(Urgency::Low, EmotionalTone::Curious).is_relaxed());
        assert!(!triage(Urgency::Low, EmotionalTone::Anxious).is_relaxed());
        assert!(!triage(Urgency::High, EmotionalTone::Neutral).is_relaxed());
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("CRITICAL".parse::<Urgency>().unwrap(), Urgency::Critical);
        assert_eq!("steps".parse::<DisplayFormat>().unwrap(), DisplayFormat::Steps);
        assert_eq!(
            "urgent".parse::<Urgency>(),
            Err(ValidationError::unknown_variant("urgency", "urgent"))
        );
    }

    #[test]
    fn estimate_deltas_compare_against_baseline() {
        let estimate = CostLatencyEstimate {
            cost_usd: 0.002,
            latency_ms: 800,
            baseline_cost_usd: Some(0.010),
            baseline_latency_ms: Some(1_200),
        };
        assert!((estimate.cost_delta_usd().unwrap() - 0.008).abs() < 1e-9);
        assert_eq!(estimate.latency_delta_ms(), Some(400));
    }

    #[test]
    fn default_metadata_is_empty() {
        assert!(MessageMetadata::default().is_empty());
    }
}
