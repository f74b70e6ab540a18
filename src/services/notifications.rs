//! Visitor notifications through a Redis outbox
//!
//! Events are appended to a Redis list once the admission transaction has
//! committed. Delivery workers drain the list and retry on their own schedule.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::{
    config::RedisConfig,
    error::{AppError, AppResult},
    models::NotificationEvent,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisOutbox {
    client: Client,
    key: String,
}

impl RedisOutbox {
    /// Connect and verify the server answers
    pub async fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            client,
            key: config.outbox_key.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for RedisOutbox {
    async fn notify(&self, event: &NotificationEvent) -> AppResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to encode notification: {}", e)))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))?;

        conn.rpush::<_, _, ()>(&self.key, payload)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to enqueue notification: {}", e)))?;

        tracing::debug!(kind = ?event.kind, request_id = %event.request_id, "Notification queued");
        Ok(())
    }
}
