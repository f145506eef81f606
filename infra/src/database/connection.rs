//! MySQL connection pool setup

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use ph_core::errors::DomainError;
use ph_shared::config::DatabaseConfig;

/// Create a MySQL connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, DomainError> {
    tracing::info!(
        max_connections = config.max_connections,
        "Connecting to MySQL"
    );

    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Failed to connect to database: {}", e),
        })
}
