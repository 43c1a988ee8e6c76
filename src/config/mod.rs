//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CHAT_ORCHESTRATOR` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use chat_orchestrator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Hourly limit: {}", config.rate_limit.hourly_limit);
//! ```

mod ai;
mod database;
mod engine;
mod error;
mod notifications;
mod rate_limit;
mod redis;
mod storage;
mod telemetry;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use notifications::NotificationsConfig;
pub use rate_limit::RateLimitConfig;
pub use self::redis::RedisConfig;
pub use storage::StorageConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

use crate::application::{EngineSettings, RequestSettings};
use crate::domain::routing::ModelRouter;
use crate::domain::settings::AIConfig;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// in-memory setup. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model gateway (mock provider when no URL is set)
    #[serde(default)]
    pub ai: AiConfig,

    /// Per-identity quotas
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Session config storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Shared quota counters (in-memory when absent)
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Conversation log (in-memory when absent)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Welcome/transcript notifications
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_ORCHESTRATOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_ORCHESTRATOR__RATE_LIMIT__HOURLY_LIMIT=5` -> `rate_limit.hourly_limit = 5`
    /// - `CHAT_ORCHESTRATOR__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_ORCHESTRATOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.rate_limit.validate()?;
        self.engine.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.notifications.validate()?;
        Ok(())
    }

    /// Engine settings derived from the `ai` and `engine` sections.
    pub fn engine_settings(&self) -> EngineSettings {
        let mut initial_config = AIConfig::with_primary_model(self.ai.primary_model.clone());
        initial_config.secondary_model = self.ai.secondary_model.clone();

        EngineSettings {
            initial_config,
            initial_domain: self.engine.initial_domain,
            router: ModelRouter::new(self.ai.fallback_provider),
            request: RequestSettings {
                temperature: self.ai.temperature,
                max_tokens: self.ai.max_tokens,
            },
            history_limit: self.engine.history_limit,
            escalation_transcript_len: self.engine.escalation_transcript_len,
            personality_seed: self.engine.personality_seed,
            personality_probability: self.engine.personality_probability,
        }
    }
}
