//! State storage implementation
//!
//! Persists wizard progress in Redis so a half-finished event survives a
//! bot restart. Keys expire with the conversation.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::{debug, warn, error};
use crate::utils::errors::Result;
use crate::config::RedisConfig;
use super::context::ConversationContext;

/// Shortest TTL handed to Redis, so an almost-expired context is still readable
const MIN_TTL_SECONDS: u64 = 60;

/// Redis-based state storage manager
#[derive(Clone)]
pub struct StateStorage {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
}

impl StateStorage {
    /// Create a new state storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Default lifetime of a wizard without its own limit
    pub fn default_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.ttl_seconds as i64)
    }

    /// Save conversation context to Redis
    pub async fn save_context(&self, context: &ConversationContext) -> Result<()> {
        let key = context_key(&self.config.prefix, context.user_id);
        let serialized = serde_json::to_string(context)?;
        let ttl_seconds = ttl_for(context.expires_at, Utc::now(), self.config.ttl_seconds);

        let mut conn = self.connection_manager.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await {
            error!(user_id = context.user_id, error = %e, "Failed to save context to Redis");
            return Err(e.into());
        }

        debug!(user_id = context.user_id, scenario = ?context.scenario, step = ?context.step,
               ttl_seconds = ttl_seconds, "Context saved");
        Ok(())
    }

    /// Load conversation context from Redis
    pub async fn load_context(&self, user_id: i64) -> Result<Option<ConversationContext>> {
        let key = context_key(&self.config.prefix, user_id);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = conn.get(&key).await?;
        let Some(data) = serialized else {
            return Ok(None);
        };

        let context: ConversationContext = match serde_json::from_str(&data) {
            Ok(context) => context,
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Discarding unreadable context");
                self.delete_context(user_id).await?;
                return Ok(None);
            }
        };

        if context.is_expired() {
            debug!(user_id = user_id, expires_at = ?context.expires_at, "Context has expired, removing");
            self.delete_context(user_id).await?;
            return Ok(None);
        }

        Ok(Some(context))
    }

    /// Delete conversation context from Redis
    pub async fn delete_context(&self, user_id: i64) -> Result<()> {
        let key = context_key(&self.config.prefix, user_id);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&key).await?;
        debug!(user_id = user_id, deleted = deleted, "Context deleted");

        Ok(())
    }

    /// Check Redis connectivity
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

fn context_key(prefix: &str, user_id: i64) -> String {
    format!("{}context:{}", prefix, user_id)
}

/// Seconds until `expires_at`, or the configured TTL when there is none
fn ttl_for(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>, default_ttl: u64) -> u64 {
    match expires_at {
        Some(expires_at) => {
            let remaining = (expires_at - now).num_seconds().max(0) as u64;
            remaining.max(MIN_TTL_SECONDS)
        }
        None => default_ttl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_context_key() {
        assert_eq!(context_key("runrace:", 42), "runrace:context:42");
    }

    #[test]
    fn test_ttl_uses_expiry() {
        let now = Utc::now();
        assert_eq!(ttl_for(Some(now + Duration::seconds(900)), now, 3600), 900);
    }

    #[test]
    fn test_ttl_has_floor() {
        let now = Utc::now();
        assert_eq!(ttl_for(Some(now + Duration::seconds(5)), now, 3600), MIN_TTL_SECONDS);
        assert_eq!(ttl_for(Some(now - Duration::seconds(5)), now, 3600), MIN_TTL_SECONDS);
    }

    #[test]
    fn test_ttl_defaults_without_expiry() {
        assert_eq!(ttl_for(None, Utc::now(), 3600), 3600);
    }
}
