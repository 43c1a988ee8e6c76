//! Application-level errors surfaced by the chat engine.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::ports::EscalationError;

/// Errors returned by `ChatEngine` operations.
///
/// Provider, quota and persistence problems are not errors at this level:
/// they are reported through `SendOutcome` and `ChatEvent`s so the session
/// keeps going.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    /// Nothing to send: blank text and no images.
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("escalation failed: {0}")]
    Escalation(#[from] EscalationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert() {
        let err: ChatError = ValidationError::empty_field("email").into();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn escalation_errors_convert() {
        let err: ChatError = EscalationError::Invalid("no email".into()).into();
        assert!(matches!(err, ChatError::Escalation(_)));
    }
}
