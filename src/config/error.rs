//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid model gateway URL format")]
    InvalidGatewayUrl,

    #[error("Temperature must be between 0 and 2")]
    InvalidTemperature,

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Rate limits must be positive and hourly_limit must not exceed daily_limit")]
    InvalidRateLimit,

    #[error("Shift threshold must be between 0 and 1")]
    InvalidShiftThreshold,

    #[error("Personality probability must be between 0 and 1")]
    InvalidPersonalityProbability,

    #[error("history_limit must be greater than zero")]
    InvalidHistoryLimit,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid notification webhook URL format")]
    InvalidWebhookUrl,
}
