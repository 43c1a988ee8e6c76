//! Chat engine tuning

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::{DEFAULT_ESCALATION_TRANSCRIPT_LEN, DEFAULT_HISTORY_LIMIT, DEFAULT_PERSONALITY_PROBABILITY};
use crate::domain::context::DEFAULT_SHIFT_THRESHOLD;
use crate::domain::foundation::ChatDomain;

/// Chat engine tuning
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Confidence a shift must exceed to switch domains
    #[serde(default = "default_shift_threshold")]
    pub shift_threshold: f64,

    /// Chance of a personality starter on a reply
    #[serde(default = "default_personality_probability")]
    pub personality_probability: f64,

    /// Fixed seed for reproducible starters
    pub personality_seed: Option<u64>,

    /// Prior messages sent with each request
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Recent messages attached to escalation tickets
    #[serde(default = "default_escalation_transcript_len")]
    pub escalation_transcript_len: usize,

    /// Domain a new session starts in
    #[serde(default)]
    pub initial_domain: ChatDomain,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.shift_threshold) {
            return Err(ValidationError::InvalidShiftThreshold);
        }
        if !(0.0..=1.0).contains(&self.personality_probability) {
            return Err(ValidationError::InvalidPersonalityProbability);
        }
        if self.history_limit == 0 {
            return Err(ValidationError::InvalidHistoryLimit);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shift_threshold: default_shift_threshold(),
            personality_probability: default_personality_probability(),
            personality_seed: None,
            history_limit: default_history_limit(),
            escalation_transcript_len: default_escalation_transcript_len(),
            initial_domain: ChatDomain::default(),
        }
    }
}

fn default_shift_threshold() -> f64 {
    DEFAULT_SHIFT_THRESHOLD
}

fn default_personality_probability() -> f64 {
    DEFAULT_PERSONALITY_PROBABILITY
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_escalation_transcript_len() -> usize {
    DEFAULT_ESCALATION_TRANSCRIPT_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.shift_threshold, 0.6);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.initial_domain, ChatDomain::Technology);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = EngineConfig {
            shift_threshold: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidShiftThreshold));
    }

    #[test]
    fn test_nan_probability_is_invalid() {
        let config = EngineConfig {
            personality_probability: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPersonalityProbability));
    }
}
