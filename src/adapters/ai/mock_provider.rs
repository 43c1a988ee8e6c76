//! Mock Model Provider for testing.
//!
//! Provides a configurable implementation of the ModelProvider port so tests
//! and the demo binary run without a real gateway.
//!
//! # Features
//!
//! - Scripted replies per model (consumed in order)
//! - Per-model simulated delays
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockModelProvider::new()
//!     .with_reply("gpt-4o", "Hello from GPT")
//!     .with_error("claude-3-5-sonnet-latest", MockError::Unavailable { message: "down".into() })
//!     .with_model_delay("gpt-4o", Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{AIError, ModelProvider, ModelRequest, ProviderReply, RawProviderReply};

/// Script key matching any model without its own script.
pub const ANY_MODEL: &str = "*";

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return an already-validated reply.
    Success(ProviderReply),
    /// Return a wire reply that goes through boundary validation.
    Raw(RawProviderReply),
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: Option<u32> },
    PaymentRequired { message: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::RateLimited { retry_after_secs },
            MockError::PaymentRequired { message } => AIError::PaymentRequired(message),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock model provider.
#[derive(Debug, Clone, Default)]
pub struct MockModelProvider {
    scripts: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ModelRequest>>>,
}

impl MockModelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, model: &str, reply: MockReply) -> Self {
        lock(&self.scripts)
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queues a plain text reply for `model`.
    pub fn with_reply(self, model: &str, content: impl Into<String>) -> Self {
        let reply = ProviderReply::text(content, model);
        self.push(model, MockReply::Success(reply))
    }

    /// Queues a fully specified reply for `model`.
    pub fn with_reply_full(self, model: &str, reply: ProviderReply) -> Self {
        self.push(model, MockReply::Success(reply))
    }

    /// Queues a wire reply for `model`, validated when served.
    pub fn with_raw_reply(self, model: &str, reply: RawProviderReply) -> Self {
        self.push(model, MockReply::Raw(reply))
    }

    /// Queues an error for `model`.
    pub fn with_error(self, model: &str, error: MockError) -> Self {
        self.push(model, MockReply::Error(error))
    }

    /// Sets simulated latency for every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets simulated latency for one model, overriding the global delay.
    pub fn with_model_delay(self, model: &str, delay: Duration) -> Self {
        lock(&self.delays).insert(model.to_string(), delay);
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ModelRequest> {
        lock(&self.calls).clone()
    }

    /// Models requested, in call order.
    pub fn called_models(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|r| r.model.clone()).collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_reply(&self, model: &str) -> MockReply {
        let mut scripts = lock(&self.scripts);
        let scripted = scripts
            .get_mut(model)
            .and_then(VecDeque::pop_front)
            .or_else(|| scripts.get_mut(ANY_MODEL).and_then(VecDeque::pop_front));
        scripted.unwrap_or_else(|| {
            MockReply::Success(ProviderReply::text(format!("Mock response from {}", model), model))
        })
    }

    fn delay_for(&self, model: &str) -> Duration {
        lock(&self.delays).get(model).copied().unwrap_or(self.delay)
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn complete(&self, request: ModelRequest) -> Result<ProviderReply, AIError> {
        let model = request.model.clone();
        lock(&self.calls).push(request);

        let delay = self.delay_for(&model);
        if !delay.is_zero() {
            sleep(delay).await;
        }

        match self.next_reply(&model) {
            MockReply::Success(reply) => Ok(reply),
            MockReply::Raw(raw) => raw.validate(&model),
            MockReply::Error(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routing::ProviderTag;

    fn request(model: &str) -> ModelRequest {
        ModelRequest::new(ProviderTag::OpenAi, model, "hello")
    }

    #[tokio::test]
    async fn unscripted_model_gets_default_reply() {
        let provider = MockModelProvider::new();
        let reply = provider.complete(request("gpt-4o")).await.unwrap();
        assert_eq!(reply.content, "Mock response from gpt-4o");
        assert_eq!(reply.model_used, "gpt-4o");
    }

    #[tokio::test]
    async fn scripts_are_per_model_and_in_order() {
        let provider = MockModelProvider::new()
            .with_reply("a", "a1")
            .with_reply("b", "b1")
            .with_reply("a", "a2");

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "a1");
        assert_eq!(provider.complete(request("b")).await.unwrap().content, "b1");
        assert_eq!(provider.complete(request("a")).await.unwrap().content, "a2");
    }

    #[tokio::test]
    async fn any_model_script_is_a_fallback() {
        let provider = MockModelProvider::new().with_reply(ANY_MODEL, "wildcard");
        assert_eq!(provider.complete(request("x")).await.unwrap().content, "wildcard");
    }

    #[tokio::test]
    async fn injected_errors_convert_to_ai_errors() {
        let provider = MockModelProvider::new().with_error(
            "gpt-4o",
            MockError::PaymentRequired {
                message: "out of credit".into(),
            },
        );
        let err = provider.complete(request("gpt-4o")).await.unwrap_err();
        assert_eq!(err, AIError::PaymentRequired("out of credit".into()));
    }

    #[tokio::test]
    async fn raw_replies_are_validated() {
        let provider = MockModelProvider::new().with_raw_reply(
            "gpt-4o",
            RawProviderReply {
                content: Some(String::new()),
                ..RawProviderReply::default()
            },
        );
        let err = provider.complete(request("gpt-4o")).await.unwrap_err();
        assert!(matches!(err, AIError::EmptyReply { .. }));
    }

    #[tokio::test]
    async fn calls_are_tracked() {
        let provider = MockModelProvider::new();
        provider.complete(request("a")).await.unwrap();
        provider.complete(request("b")).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.called_models(), vec!["a", "b"]);
        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn model_delay_overrides_global_delay() {
        let provider = MockModelProvider::new()
            .with_delay(Duration::from_millis(1))
            .with_model_delay("slow", Duration::from_millis(30));
        assert_eq!(provider.delay_for("slow"), Duration::from_millis(30));
        assert_eq!(provider.delay_for("fast"), Duration::from_millis(1));
    }
}
