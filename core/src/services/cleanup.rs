//! Storage hygiene for ephemeral auth artifacts
//!
//! Expiry is checked lazily at verification time, so nothing here is
//! needed for correctness; this service only bounds table growth by
//! purging stale OTP codes, link tokens, and out-of-retention audit
//! events on a fixed interval.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::errors::DomainError;
use crate::repositories::{AuditRepository, LinkTokenRepository, OtpRepository};

/// Configuration for the cleanup service
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Hours to keep OTP codes after creation
    pub otp_retention_hours: i64,
    /// Hours to keep link tokens after creation
    pub link_token_retention_hours: i64,
    /// Days to keep audit events (security-review retention window)
    pub audit_retention_days: i64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            otp_retention_hours: 24,
            link_token_retention_hours: 24,
            audit_retention_days: 90,
            enabled: true,
        }
    }
}

/// Summary of one cleanup cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub otp_codes_deleted: u64,
    pub link_tokens_deleted: u64,
    pub audit_events_deleted: u64,
}

/// Service purging stale authentication artifacts
pub struct CleanupService<O, L, A>
where
    O: OtpRepository,
    L: LinkTokenRepository,
    A: AuditRepository,
{
    otp_repository: Arc<O>,
    link_repository: Arc<L>,
    audit_repository: Arc<A>,
    config: CleanupConfig,
}

impl<O, L, A> CleanupService<O, L, A>
where
    O: OtpRepository + 'static,
    L: LinkTokenRepository + 'static,
    A: AuditRepository + 'static,
{
    pub fn new(
        otp_repository: Arc<O>,
        link_repository: Arc<L>,
        audit_repository: Arc<A>,
        config: CleanupConfig,
    ) -> Self {
        Self {
            otp_repository,
            link_repository,
            audit_repository,
            config,
        }
    }

    /// Run a single cleanup cycle
    pub async fn run_once(&self) -> Result<CleanupResult, DomainError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let now = Utc::now();
        let mut result = CleanupResult::default();

        result.otp_codes_deleted = self
            .otp_repository
            .delete_expired(now - Duration::hours(self.config.otp_retention_hours))
            .await?;

        result.link_tokens_deleted = self
            .link_repository
            .delete_expired(now - Duration::hours(self.config.link_token_retention_hours))
            .await?;

        result.audit_events_deleted = self
            .audit_repository
            .delete_older_than(now - Duration::days(self.config.audit_retention_days))
            .await?;

        info!(
            otp_codes = result.otp_codes_deleted,
            link_tokens = result.link_tokens_deleted,
            audit_events = result.audit_events_deleted,
            event = "cleanup_completed",
            "Auth storage cleanup cycle finished"
        );

        Ok(result)
    }

    /// Run cleanup on the configured interval until the task is aborted
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let interval = std::time::Duration::from_secs(self.config.interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup is quiet
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(error = %e, "Auth storage cleanup cycle failed");
                }
            }
        })
    }
}
