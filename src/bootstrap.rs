//! Builds the engine's ports from configuration.
//!
//! Each backend is optional: Redis, PostgreSQL, the model gateway and the
//! notification webhook are used when configured, in-memory or mock
//! adapters otherwise.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::{
    FileSessionStorage, GatewayConfig, GatewayModelProvider, InMemoryConversationLog,
    InMemoryEscalationDesk, InMemoryRateLimitService, InMemorySessionStorage, LoggingNotifier,
    MockModelProvider, PostgresConversationLog, RedisRateLimitService, TracingEventPublisher,
    WebhookNotifier,
};
use crate::application::ChatEngineDeps;
use crate::config::{AppConfig, DatabaseConfig, RedisConfig};
use crate::domain::context::KeywordContextClassifier;
use crate::domain::foundation::SystemClock;
use crate::domain::rate_limit::RateLimits;
use crate::ports::{
    AIError, ConversationLog, ConversationLogError, EventPublisher, ModelProvider,
    NotificationError, Notifier, RateLimitService, SessionStorage,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis connection timed out")]
    RedisTimeout,

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conversation log setup failed: {0}")]
    ConversationLog(#[from] ConversationLogError),

    #[error("model provider setup failed: {0}")]
    Provider(#[from] AIError),

    #[error("notifier setup failed: {0}")]
    Notifier(#[from] NotificationError),
}

/// Wires every port for `config`, publishing events to `events`.
///
/// # Errors
///
/// Returns `BootstrapError` when a configured backend cannot be reached.
pub async fn build_deps(
    config: &AppConfig,
    events: Arc<dyn EventPublisher>,
) -> Result<ChatEngineDeps, BootstrapError> {
    let clock = Arc::new(SystemClock);
    let limits = config.rate_limit.limits();

    Ok(ChatEngineDeps {
        provider: model_provider(config)?,
        rate_limits: rate_limit_service(config.redis.as_ref(), limits).await?,
        conversation_log: conversation_log(config.database.as_ref()).await?,
        notifier: notifier(config)?,
        escalation: Arc::new(InMemoryEscalationDesk::new()),
        session_storage: session_storage(config),
        events,
        detector: Arc::new(KeywordContextClassifier::new(config.engine.shift_threshold)),
        clock,
    })
}

/// Default event sink: structured log records.
pub fn tracing_events() -> Arc<dyn EventPublisher> {
    Arc::new(TracingEventPublisher::new())
}

fn model_provider(config: &AppConfig) -> Result<Arc<dyn ModelProvider>, BootstrapError> {
    match config.ai.gateway_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let mut gateway = GatewayConfig::new(url);
            if let Some(key) = config.ai.api_key.as_deref().filter(|k| !k.is_empty()) {
                gateway = gateway.with_api_key(key);
            }
            tracing::info!(gateway = url, "Using model gateway");
            Ok(Arc::new(GatewayModelProvider::new(gateway)?))
        }
        None => {
            tracing::info!("No model gateway configured, using mock provider");
            Ok(Arc::new(MockModelProvider::new()))
        }
    }
}

async fn rate_limit_service(
    redis: Option<&RedisConfig>,
    limits: RateLimits,
) -> Result<Arc<dyn RateLimitService>, BootstrapError> {
    let Some(redis) = redis else {
        tracing::info!("No Redis configured, quotas are per process");
        return Ok(Arc::new(InMemoryRateLimitService::new(limits)));
    };

    let client = redis::Client::open(redis.url.as_str())?;
    let conn = tokio::time::timeout(redis.timeout(), client.get_multiplexed_async_connection())
        .await
        .map_err(|_| BootstrapError::RedisTimeout)??;
    tracing::info!("Connected to Redis for quotas");
    Ok(Arc::new(
        RedisRateLimitService::new(conn, limits).with_key_prefix(redis.key_prefix.clone()),
    ))
}

async fn conversation_log(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn ConversationLog>, BootstrapError> {
    let Some(database) = database else {
        tracing::info!("No database configured, conversation log is in memory");
        return Ok(Arc::new(InMemoryConversationLog::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(&database.url)
        .await?;
    let log = PostgresConversationLog::new(pool);
    if database.run_migrations {
        log.migrate(&database.migrations_dir).await?;
    }
    tracing::info!("Connected to PostgreSQL conversation log");
    Ok(Arc::new(log))
}

fn notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>, BootstrapError> {
    let Some(url) = config.notifications.webhook_url.as_deref().filter(|u| !u.is_empty()) else {
        return Ok(Arc::new(LoggingNotifier::new()));
    };
    let mut webhook = WebhookNotifier::new(url)?;
    if let Some(secret) = config.notifications.webhook_secret.as_deref() {
        webhook = webhook.with_secret(secret);
    }
    Ok(Arc::new(webhook))
}

fn session_storage(config: &AppConfig) -> Arc<dyn SessionStorage> {
    match &config.storage.session_dir {
        Some(dir) => Arc::new(FileSessionStorage::new(dir)),
        None => Arc::new(InMemorySessionStorage::new()),
    }
}
