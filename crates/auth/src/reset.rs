use app_error::AppResult;
use app_models::token::ResetToken;
use app_store::ResetTokenRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Owns the single-active-reset-token-per-user invariant and its TTL.
///
/// Issuing overwrites any existing row for the owner; lookups filter on
/// freshness. There is deliberately no consume-on-use and no deletion of
/// expired rows: a successfully exchanged token stays valid until its TTL
/// elapses, matching the reference behavior.
#[derive(Clone)]
pub struct ResetTokens {
    repo: Arc<dyn ResetTokenRepository>,
    ttl: Duration,
}

impl ResetTokens {
    pub fn new(repo: Arc<dyn ResetTokenRepository>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    /// Mint a fresh random token for `user_id` and upsert it keyed on the
    /// owner. The upsert is a single atomic store operation; a concurrent
    /// or repeated request simply overwrites value and expiry.
    pub async fn issue(&self, user_id: Uuid) -> AppResult<ResetToken> {
        let token = ResetToken::issue(user_id, self.ttl);
        let stored = self.repo.upsert_by_owner(token).await?;
        info!(user_id = %user_id, "Issued password reset token");
        Ok(stored)
    }

    /// The row whose value matches and whose expiry is after `now`;
    /// absent or expired yields `Ok(None)` so the caller can map it to a
    /// domain failure.
    pub async fn lookup_valid(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ResetToken>> {
        Ok(self.repo.find_valid(value, now).await?)
    }
}
