//! Redis client wrapper
//!
//! Thin wrapper around a multiplexed async connection, shared by the
//! rate limiter. Keys are optionally namespaced with a configured
//! prefix.

use redis::aio::MultiplexedConnection;
use redis::Client;

use ph_core::errors::DomainError;
use ph_shared::config::CacheConfig;

/// Shared Redis connection with key namespacing
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    key_prefix: Option<String>,
}

impl RedisClient {
    /// Connect to Redis using the given configuration
    pub async fn new(config: &CacheConfig) -> Result<Self, DomainError> {
        tracing::info!("Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| DomainError::Internal {
            message: format!("Invalid Redis URL: {}", e),
        })?;

        let connection = tokio::time::timeout(
            std::time::Duration::from_secs(config.connection_timeout),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| DomainError::Internal {
            message: "Redis connection timed out".to_string(),
        })?
        .map_err(|e| DomainError::Internal {
            message: format!("Failed to connect to Redis: {}", e),
        })?;

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Clone of the underlying multiplexed connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Apply the configured namespace prefix to a key
    pub fn key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}
