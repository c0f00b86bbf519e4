use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A password-reset token row. At most one exists per owner: issuing a new
/// one for the same user overwrites `token` and `expires_at` in place.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResetToken {
    pub id: Uuid,
    /// Opaque random value handed to the user, a v4 UUID string.
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Mint a fresh token for `user_id`, expiring `ttl` from now.
    pub fn issue(user_id: Uuid, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
